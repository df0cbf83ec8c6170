//! Expression templates.
//!
//! A template is C++ text with two placeholders: `~` stands for the next
//! resolved operand and `^` for the current evaluation point. Placeholders
//! are filled in left to right at substitution time, so operand lowering (and
//! any cache slot it allocates) happens in template order.

/// One piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Verbatim text.
    Text(&'t str),
    /// The `index`-th operand placeholder.
    Operand(usize),
    /// The current point.
    Point,
}

/// A template split into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'t> {
    segments: Vec<Segment<'t>>,
    placeholders: usize,
}

impl<'t> Template<'t> {
    pub fn parse(source: &'t str) -> Self {
        let mut segments = Vec::new();
        let mut placeholders = 0;
        let mut start = 0;
        for (i, c) in source.char_indices() {
            let segment = match c {
                '~' => {
                    placeholders += 1;
                    Segment::Operand(placeholders - 1)
                }
                '^' => Segment::Point,
                _ => continue,
            };
            if start < i {
                segments.push(Segment::Text(&source[start..i]));
            }
            segments.push(segment);
            start = i + c.len_utf8();
        }
        if start < source.len() {
            segments.push(Segment::Text(&source[start..]));
        }
        Self {
            segments,
            placeholders,
        }
    }

    /// Number of `~` placeholders.
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    pub fn segments(&self) -> &[Segment<'t>] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary() {
        let t = Template::parse("(~ + ~)");
        assert_eq!(t.placeholders(), 2);
        assert_eq!(
            t.segments(),
            &[
                Segment::Text("("),
                Segment::Operand(0),
                Segment::Text(" + "),
                Segment::Operand(1),
                Segment::Text(")"),
            ]
        );
    }

    #[test]
    fn test_parse_point_and_adjacent_placeholders() {
        let t = Template::parse("Basis(^,~~)");
        assert_eq!(t.placeholders(), 2);
        assert_eq!(
            t.segments(),
            &[
                Segment::Text("Basis("),
                Segment::Point,
                Segment::Text(","),
                Segment::Operand(0),
                Segment::Operand(1),
                Segment::Text(")"),
            ]
        );
    }

    #[test]
    fn test_parse_plain_text() {
        let t = Template::parse("HexBump");
        assert_eq!(t.placeholders(), 0);
        assert_eq!(t.segments(), &[Segment::Text("HexBump")]);
        assert!(Template::parse("").segments().is_empty());
    }
}
