use game_types::WordEffect;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Compute the displayed form of `label` for the given effect.
pub fn display_form(effect: WordEffect, label: &str, rng: &mut dyn RngCore) -> String {
    match effect {
        WordEffect::None => label.to_string(),
        WordEffect::Hidden => {
            let chars: Vec<char> = label.chars().collect();
            if chars.is_empty() {
                return String::new();
            }
            let position = rng.gen_range(0..chars.len());
            chars
                .iter()
                .enumerate()
                .map(|(i, &c)| if i == position { '_' } else { c })
                .collect()
        }
        WordEffect::Reverse => label.chars().rev().collect(),
        WordEffect::Anagram => {
            let mut chars: Vec<char> = label.chars().collect();
            chars.shuffle(rng);
            chars.into_iter().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sorted_chars(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn test_none_and_reverse() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(display_form(WordEffect::None, "history", &mut rng), "history");
        assert_eq!(display_form(WordEffect::Reverse, "history", &mut rng), "yrotsih");
        assert_eq!(display_form(WordEffect::Reverse, "été", &mut rng), "été");
    }

    #[test]
    fn test_hidden_masks_exactly_one_letter() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let shown = display_form(WordEffect::Hidden, "fenêtre", &mut rng);
            assert_eq!(shown.chars().count(), 7);
            assert_eq!(shown.chars().filter(|&c| c == '_').count(), 1);

            let differing = shown
                .chars()
                .zip("fenêtre".chars())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(differing, 1);
        }
    }

    #[test]
    fn test_anagram_keeps_letters() {
        let mut rng = StdRng::seed_from_u64(9);
        let shown = display_form(WordEffect::Anagram, "keyboard", &mut rng);
        assert_eq!(sorted_chars(&shown), sorted_chars("keyboard"));
    }

    #[test]
    fn test_empty_label() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(display_form(WordEffect::Hidden, "", &mut rng), "");
        assert_eq!(display_form(WordEffect::Anagram, "", &mut rng), "");
    }
}
