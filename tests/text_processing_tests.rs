#[cfg(test)]
mod tests {
    use nutribot::text_processing::{preview, split_message, truncate_input, TRUNCATION_SUFFIX};

    fn paragraph(words: usize) -> String {
        (0..words)
            .map(|i| format!("слово{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_chunks_respect_limit() {
        let text = paragraph(2000);
        let chunks = split_message(&text, 4096);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4096);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_chunks_preserve_words() {
        let text = paragraph(500);
        let chunks = split_message(&text, 300);

        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
        for chunk in &chunks {
            assert!(!chunk.starts_with(' '));
        }
    }

    #[test]
    fn test_newline_preferred_over_space() {
        let text = format!("{}\n{}", "а ".repeat(20).trim_end(), "б ".repeat(20).trim_end());
        let chunks = split_message(&text, 60);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].chars().all(|c| c == 'а' || c == ' '));
        assert!(chunks[1].starts_with('б'));
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let text = "я".repeat(10_000);
        let chunks = split_message(&text, 4096);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 4096);
        assert_eq!(chunks[2].chars().count(), 10_000 - 2 * 4096);
    }

    #[test]
    fn test_leading_whitespace_dropped_between_chunks() {
        let chunks = split_message("abcde\n\n\n   fghij", 6);
        assert_eq!(chunks, vec!["abcde".to_string(), "fghij".to_string()]);
    }

    #[test]
    fn test_text_at_limit_is_single_chunk() {
        let text = "ж".repeat(4096);
        assert_eq!(split_message(&text, 4096), vec![text]);
    }

    #[test]
    fn test_truncate_input() {
        let input = "щ".repeat(2001);
        let truncated = truncate_input(&input, 2000).unwrap();

        assert_eq!(truncated.chars().count(), 2000 + TRUNCATION_SUFFIX.chars().count());
        assert!(truncated.ends_with(TRUNCATION_SUFFIX));
        assert!(truncate_input(&"щ".repeat(2000), 2000).is_none());
        assert!(truncate_input("", 2000).is_none());
    }

    #[test]
    fn test_preview_multibyte() {
        assert_eq!(preview("проверка", 4), "пров...");
        assert_eq!(preview("да", 4), "да");
    }
}
