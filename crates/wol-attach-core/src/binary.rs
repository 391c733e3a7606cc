//! Binary input codec.

/// Convert a widget binary-input string into a byte buffer.
///
/// Each char carries one byte in its code point, so the output has exactly
/// one byte per char. Code points above 255 keep only their low byte.
///
/// Input is counted in Unicode scalar values, not UTF-16 code units: a char
/// outside the Basic Multilingual Plane yields one byte here, where a
/// code-unit walk would yield two. Widgets only emit codes 0..=255 on this
/// path, so both readings agree for well-formed input.
pub fn binary_string_to_bytes(data: &str) -> Vec<u8> {
    data.chars().map(|c| (u32::from(c) & 0xFF) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_latin1_code_maps_to_its_byte() {
        let input: String = (0u8..=255).map(char::from).collect();
        let bytes = binary_string_to_bytes(&input);
        assert_eq!(bytes.len(), 256);
        for (i, byte) in bytes.iter().enumerate() {
            assert_eq!(usize::from(*byte), i);
        }
    }

    #[test]
    fn mouse_report_bytes() {
        // X10 mouse report: ESC [ M Cb Cx Cy with high coordinates
        let input = "\u{1b}[M \u{ff}\u{80}";
        assert_eq!(
            binary_string_to_bytes(input),
            vec![0x1b, b'[', b'M', b' ', 0xff, 0x80]
        );
    }

    #[test]
    fn wide_code_points_keep_low_byte() {
        assert_eq!(binary_string_to_bytes("\u{141}"), vec![0x41]);
    }

    #[test]
    fn astral_char_yields_one_byte() {
        // U+1F600 masks to 0x00
        assert_eq!(binary_string_to_bytes("a\u{1F600}"), vec![b'a', 0x00]);
    }

    #[test]
    fn empty_input_yields_empty_buffer() {
        assert!(binary_string_to_bytes("").is_empty());
    }
}
