use regex::Regex;

/// Cleans raw request text down to printable ASCII and CJK ideographs.
pub struct TextNormalizer {
    line_breaks: Regex,
    disallowed: Regex,
    punctuation: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        TextNormalizer {
            line_breaks: Regex::new(r"[\r\n]+").expect("Unable to compile line break regex"),
            disallowed: Regex::new(r"[^\x20-\x7E\x{4E00}-\x{9FFF}]+")
                .expect("Unable to compile charset regex"),
            punctuation: Regex::new(r"[^\w\s]").expect("Unable to compile punctuation regex"),
        }
    }
}

impl TextNormalizer {
    /// Line breaks become a single space before the character set filter
    /// runs, otherwise words on adjacent lines would be glued together.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.line_breaks.replace_all(text, " ");
        let text = self.disallowed.replace_all(&text, "");
        let text = self.punctuation.replace_all(&text, "");

        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::TextNormalizer;

    #[test]
    fn strips_to_allowed_charset() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("数据,分析! 😀 système"), "数据分析  systme");
        assert_eq!(normalizer.normalize("  hello, world.  "), "hello world");
        assert_eq!(normalizer.normalize("ｆｕｌｌwidth"), "width");
    }

    #[test]
    fn line_breaks_become_spaces() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("first\r\n\nsecond\nthird"), "first second third");
        assert_eq!(normalizer.normalize("\n\n数据\n"), "数据");
    }

    #[test]
    fn keeps_word_characters() {
        let normalizer = TextNormalizer::default();
        assert_eq!(normalizer.normalize("snake_case 42 ok"), "snake_case 42 ok");
        assert_eq!(normalizer.normalize("!!!"), "");
    }

    #[test]
    fn normalizing_twice_is_a_fixed_point() {
        let normalizer = TextNormalizer::default();
        let samples = [
            "数据 数据 数据 分析 分析 系统 系统 系统 系统 工程",
            "! leading punctuation, trailing?",
            "tabs\tand   spaces\r\nmixed 中文，标点。",
            "",
            "   ",
        ];

        for sample in samples {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "input {sample:?}");
        }
    }
}
