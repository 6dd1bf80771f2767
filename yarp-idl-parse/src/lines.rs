use crate::ast::Position;

/// Maps byte offsets in a source file to 1-based line and column positions.
#[derive(Debug, Clone)]
pub(crate) struct LineResolver<'a> {
    source: &'a str,
    lines: Vec<usize>,
}

impl<'a> LineResolver<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = source
            .match_indices('\n')
            .map(|(index, _)| index + 1)
            .collect();
        LineResolver { source, lines }
    }

    pub fn resolve(&self, offset: usize) -> Position {
        let (line, start) = match self.lines.binary_search(&offset) {
            Ok(index) => (index + 1, self.lines[index]),
            Err(0) => (0, 0),
            Err(index) => (index, self.lines[index - 1]),
        };

        let column = self
            .source
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        Position {
            line: line + 1,
            column: column + 1,
        }
    }
}

#[test]
fn resolve_line_number() {
    let resolver = LineResolver::new("hello\nworld\nfoo");

    let pos = |line, column| Position { line, column };
    assert_eq!(resolver.resolve(0), pos(1, 1));
    assert_eq!(resolver.resolve(4), pos(1, 5));
    assert_eq!(resolver.resolve(5), pos(1, 6));
    assert_eq!(resolver.resolve(6), pos(2, 1));
    assert_eq!(resolver.resolve(7), pos(2, 2));
    assert_eq!(resolver.resolve(11), pos(2, 6));
    assert_eq!(resolver.resolve(12), pos(3, 1));
    assert_eq!(resolver.resolve(15), pos(3, 4));
}

#[test]
fn resolve_multibyte_columns() {
    let resolver = LineResolver::new("é ü\nñx");

    assert_eq!(resolver.resolve(3), Position { line: 1, column: 3 });
    assert_eq!(resolver.resolve(6), Position { line: 2, column: 1 });
    assert_eq!(resolver.resolve(8), Position { line: 2, column: 2 });
}
