use game_types::{LetterFeedback, LetterStatus};

pub struct FeedbackEngine;

impl FeedbackEngine {
    /// Compare a guess against the target word, one status per guess letter.
    ///
    /// Exact matches are resolved first and consume their target slot; the
    /// remaining letters then claim the first unconsumed matching slot
    /// elsewhere in the target, so a letter is never reported more often
    /// than it occurs in the target.
    pub fn evaluate(guess: &str, target: &str) -> Vec<LetterFeedback> {
        let guess_chars: Vec<char> = guess.to_uppercase().chars().collect();
        let target_chars: Vec<char> = target.to_uppercase().chars().collect();

        let mut statuses: Vec<Option<LetterStatus>> = vec![None; guess_chars.len()];
        let mut consumed = vec![false; target_chars.len()];

        // First pass: exact positions
        for (i, &ch) in guess_chars.iter().enumerate() {
            if target_chars.get(i) == Some(&ch) {
                statuses[i] = Some(LetterStatus::CorrectPosition);
                consumed[i] = true;
            }
        }

        // Second pass: letters present elsewhere
        for (i, &ch) in guess_chars.iter().enumerate() {
            if statuses[i].is_some() {
                continue;
            }

            let slot = target_chars
                .iter()
                .enumerate()
                .position(|(j, &target_ch)| j != i && !consumed[j] && target_ch == ch);

            statuses[i] = Some(match slot {
                Some(j) => {
                    consumed[j] = true;
                    LetterStatus::CorrectWrongPosition
                }
                None => LetterStatus::Absent,
            });
        }

        guess_chars
            .into_iter()
            .zip(statuses)
            .map(|(ch, status)| LetterFeedback {
                letter: ch.to_string(),
                status: status.unwrap_or(LetterStatus::Absent),
            })
            .collect()
    }

    pub fn is_solved(feedback: &[LetterFeedback]) -> bool {
        !feedback.is_empty()
            && feedback
                .iter()
                .all(|f| f.status == LetterStatus::CorrectPosition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LetterStatus::*;

    fn statuses(guess: &str, target: &str) -> Vec<LetterStatus> {
        FeedbackEngine::evaluate(guess, target)
            .into_iter()
            .map(|f| f.status)
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let feedback = FeedbackEngine::evaluate("plato", "PLATO");

        assert_eq!(feedback.len(), 5);
        assert!(FeedbackEngine::is_solved(&feedback));
        assert_eq!(feedback[0].letter, "P");
    }

    #[test]
    fn test_partial_match() {
        // P L A T O vs P R A D O
        assert_eq!(
            statuses("PLATO", "PRADO"),
            vec![CorrectPosition, Absent, CorrectPosition, Absent, CorrectPosition]
        );
        // B R A Z O vs C A M P O
        assert_eq!(
            statuses("BRAZO", "CAMPO"),
            vec![Absent, Absent, CorrectWrongPosition, Absent, CorrectPosition]
        );
    }

    #[test]
    fn test_repeated_letters_are_not_double_counted() {
        // Target L L A M A, guess A L A L A:
        // L(1), A(2), A(4) are exact; the A at 0 finds no free A left,
        // the L at 3 takes the free L at 0.
        assert_eq!(
            statuses("ALALA", "LLAMA"),
            vec![Absent, CorrectPosition, CorrectPosition, CorrectWrongPosition, CorrectPosition]
        );
    }

    #[test]
    fn test_guess_repeats_letter_target_has_once() {
        // only one O in PLATO: first O in scan order is yellow, second is gray
        assert_eq!(
            statuses("OOZEE", "PLATO"),
            vec![CorrectWrongPosition, Absent, Absent, Absent, Absent]
        );
    }

    #[test]
    fn test_exact_match_wins_over_earlier_misplaced_copy() {
        // second A is exact, so the first A must not steal the only A
        assert_eq!(
            statuses("AAXXX", "BAYYY"),
            vec![Absent, CorrectPosition, Absent, Absent, Absent]
        );
    }

    #[test]
    fn test_marks_never_exceed_target_occurrences() {
        let cases = [
            ("LLLLL", "HELLO"),
            ("EEEEE", "GEESE"),
            ("ABBEY", "BABES"),
            ("SPEED", "ERASE"),
            ("ALALA", "LLAMA"),
        ];

        for (guess, target) in cases {
            let feedback = FeedbackEngine::evaluate(guess, target);
            assert_eq!(feedback.len(), 5);

            for ch in guess.chars() {
                let marked = feedback
                    .iter()
                    .filter(|f| f.letter == ch.to_string() && f.status != Absent)
                    .count();
                let in_target = target.chars().filter(|&c| c == ch).count();
                assert!(
                    marked <= in_target,
                    "{} vs {}: letter {} marked {} times, target has {}",
                    guess,
                    target,
                    ch,
                    marked,
                    in_target
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            FeedbackEngine::evaluate("ABBEY", "BABES"),
            FeedbackEngine::evaluate("ABBEY", "BABES")
        );
    }

    #[test]
    fn test_not_solved() {
        let feedback = FeedbackEngine::evaluate("PRADO", "PLATO");
        assert!(!FeedbackEngine::is_solved(&feedback));
        assert!(!FeedbackEngine::is_solved(&[]));
    }
}
