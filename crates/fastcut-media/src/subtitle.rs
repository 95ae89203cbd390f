//! Word-by-word `.ass` subtitle track generation.
//!
//! Words are grouped into fixed-size blocks; each word in a block gets one
//! dialogue line where it is highlighted in yellow while the rest of the
//! block stays white. Font size and bottom margin scale with the target
//! resolution.

use std::path::Path;

use fastcut_models::WordSpan;

use crate::error::MediaResult;

/// Words shown per subtitle block.
const WORDS_PER_BLOCK: usize = 3;

/// ASS colour override for the active word (BGR yellow).
const HIGHLIGHT_COLOUR: &str = "{\\c&H0000FFFF&}";
const RESET_COLOUR: &str = "{\\c&HFFFFFF&}";

fn ass_header(width: u32, height: u32) -> String {
    let font_size = (height / 40).max(28);
    let margin_v = height / 5;

    format!(
        "[Script Info]\n\
         Title: FastCut Subtitles\n\
         ScriptType: v4.00+\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
         OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, \
         ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, \
         Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,Arial,{font_size},&H00FFFFFF,&H00FFFFFF,\
         &H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,4,0,2,40,40,{margin_v},1\n\
         Style: Highlight,Arial,{font_size},&H0000FFFF,&H0000FFFF,\
         &H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,4,0,2,40,40,{margin_v},1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, \
         Effect, Text\n"
    )
}

/// Convert seconds to ASS time format (`H:MM:SS.CC`).
fn format_ass_time(seconds: f64) -> String {
    let h = (seconds / 3600.0) as u32;
    let m = ((seconds % 3600.0) / 60.0) as u32;
    let s = (seconds % 60.0) as u32;
    let cs = ((seconds % 1.0) * 100.0) as u32;
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

fn build_block_dialogues(block: &[WordSpan]) -> String {
    let Some(last) = block.last() else {
        return String::new();
    };
    let block_end = last.end;

    let mut lines = String::new();
    for (active_idx, active) in block.iter().enumerate() {
        let start = format_ass_time(active.start);
        // The last word of a block holds until the block ends.
        let end = if active_idx == block.len() - 1 {
            format_ass_time(block_end)
        } else {
            format_ass_time(active.end)
        };

        let text: Vec<String> = block
            .iter()
            .enumerate()
            .map(|(i, word)| {
                if i == active_idx {
                    format!("{HIGHLIGHT_COLOUR}{}{RESET_COLOUR}", word.word)
                } else {
                    word.word.clone()
                }
            })
            .collect();

        lines.push_str(&format!(
            "Dialogue: 0,{start},{end},Default,,0,0,0,,{}\n",
            text.join(" ")
        ));
    }
    lines
}

/// Render a full `.ass` document for the given words and target resolution.
pub fn generate_ass(words: &[WordSpan], resolution: (u32, u32)) -> String {
    let (width, height) = resolution;
    let mut content = ass_header(width, height);
    for block in words.chunks(WORDS_PER_BLOCK) {
        content.push_str(&build_block_dialogues(block));
    }
    content
}

/// Write a subtitle track for `words` to `output_path`.
pub fn write_ass(words: &[WordSpan], output_path: &Path, resolution: (u32, u32)) -> MediaResult<()> {
    std::fs::write(output_path, generate_ass(words, resolution))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> WordSpan {
        WordSpan::new(text, start, end)
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(61.5), "0:01:01.50");
        assert_eq!(format_ass_time(3723.25), "1:02:03.25");
    }

    #[test]
    fn test_each_word_gets_one_dialogue_line() {
        let words = vec![
            word("one", 0.0, 0.4),
            word("two", 0.4, 0.8),
            word("three", 0.8, 1.2),
            word("four", 1.2, 1.6),
        ];
        let ass = generate_ass(&words, (1080, 1920));

        assert_eq!(ass.matches("Dialogue:").count(), 4);
        // Two blocks of up to three words each.
        assert!(ass.contains("one two three"));
    }

    #[test]
    fn test_active_word_is_highlighted() {
        let words = vec![word("hello", 0.0, 0.5), word("world", 0.5, 1.0)];
        let ass = generate_ass(&words, (1080, 1920));

        assert!(ass.contains(&format!("{HIGHLIGHT_COLOUR}hello{RESET_COLOUR} world")));
        assert!(ass.contains(&format!("hello {HIGHLIGHT_COLOUR}world{RESET_COLOUR}")));
    }

    #[test]
    fn test_header_scales_with_resolution() {
        let ass = generate_ass(&[], (1080, 1920));
        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("Fontsize") || ass.contains(",48,"));

        // 1920 / 40 = 48pt, margin 1920 / 5 = 384.
        assert!(ass.contains(",48,"));
        assert!(ass.contains(",384,"));
    }

    #[test]
    fn test_empty_words_yield_header_only() {
        let ass = generate_ass(&[], (1080, 1920));
        assert!(!ass.contains("Dialogue:"));
        assert!(ass.contains("[Events]"));
    }
}
