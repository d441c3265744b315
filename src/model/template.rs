//! `__repr__` / `__str__` format templates.
//!
//! Templates use `{name}` placeholders with an optional conversion (`!r`, `!s`)
//! and an optional format spec (`:[[fill]align][width][.precision][type]`).
//! `{{` and `}}` produce literal braces.

use std::fmt;

/// A value that can be substituted into a template.
pub trait Formattable {
    /// Text used by `{name}` and `{name!s}`.
    fn format_str(&self) -> String;
    /// Text used by `{name!r}`.
    fn format_repr(&self) -> String;
    /// Numeric view used by the `d` and `f` spec types.
    fn as_number(&self) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Str,
    Repr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Str,
    Int,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub width: usize,
    pub precision: Option<usize>,
    pub kind: Option<SpecKind>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            width: 0,
            precision: None,
            kind: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub conversion: Conversion,
    pub spec: FormatSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed format template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err("single '}' encountered".to_string()),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err("nested replacement fields are not supported".to_string());
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err("unmatched '{'".to_string());
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(parse_field(&body)?));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The default repr: `{class_name}(a={a!r}, b={b!r})`.
    pub fn default_repr<'a>(attributes: impl IntoIterator<Item = &'a str>) -> Self {
        let fields: Vec<String> = attributes
            .into_iter()
            .map(|name| format!("{name}={{{name}!r}}"))
            .collect();
        let source = format!("{{class_name}}({})", fields.join(", "));
        // Built from identifiers only, so parsing cannot fail.
        Self::parse(&source).unwrap_or(Self {
            source,
            segments: Vec::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names referenced by placeholders, in order of appearance.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(field) => Some(field.name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute each placeholder with the value `resolve` returns for its name.
    pub fn render<V, E, F>(&self, mut resolve: F) -> Result<String, E>
    where
        V: Formattable,
        F: FnMut(&str) -> Result<V, E>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    let value = resolve(&field.name)?;
                    out.push_str(&apply(field, &value));
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for FormatTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_field(body: &str) -> Result<Field, String> {
    let (head, spec) = match body.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (body, None),
    };
    let (name, conversion) = match head.split_once('!') {
        Some((name, "r")) => (name, Conversion::Repr),
        Some((name, "s")) => (name, Conversion::Str),
        Some((_, other)) => return Err(format!("unknown conversion '!{}'", other)),
        None => (head, Conversion::Str),
    };
    if name.is_empty() {
        return Err("positional fields are not supported".to_string());
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("invalid field name '{}'", name));
    }
    let spec = match spec {
        Some(spec) => parse_spec(spec)?,
        None => FormatSpec::default(),
    };
    Ok(Field {
        name: name.to_string(),
        conversion,
        spec,
    })
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    }
}

fn parse_spec(spec: &str) -> Result<FormatSpec, String> {
    let chars: Vec<char> = spec.chars().collect();
    let mut out = FormatSpec::default();
    let mut i = 0;

    if chars.len() >= 2 && align_of(chars[1]).is_some() {
        out.fill = chars[0];
        out.align = align_of(chars[1]);
        i = 2;
    } else if let Some(align) = chars.first().and_then(|c| align_of(*c)) {
        out.align = Some(align);
        i = 1;
    }

    let start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i > start {
        let digits: String = chars[start..i].iter().collect();
        out.width = digits.parse().map_err(|_| format!("invalid width in '{}'", spec))?;
    }

    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return Err(format!("format specifier missing precision in '{}'", spec));
        }
        let digits: String = chars[start..i].iter().collect();
        out.precision = Some(
            digits
                .parse()
                .map_err(|_| format!("invalid precision in '{}'", spec))?,
        );
    }

    if i < chars.len() {
        out.kind = match chars[i] {
            's' => Some(SpecKind::Str),
            'd' => Some(SpecKind::Int),
            'f' => Some(SpecKind::Fixed),
            other => return Err(format!("unknown format code '{}'", other)),
        };
        i += 1;
    }

    if i != chars.len() {
        return Err(format!("invalid format specifier '{}'", spec));
    }
    Ok(out)
}

fn apply<V: Formattable>(field: &Field, value: &V) -> String {
    let spec = &field.spec;
    let number = match field.conversion {
        Conversion::Str => value.as_number(),
        Conversion::Repr => None,
    };

    let (text, numeric) = match (spec.kind, number) {
        (Some(SpecKind::Int), Some(n)) => (format!("{}", n.round() as i64), true),
        (Some(SpecKind::Fixed), Some(n)) => {
            (format!("{:.*}", spec.precision.unwrap_or(6), n), true)
        }
        _ => {
            let mut text = match field.conversion {
                Conversion::Str => value.format_str(),
                Conversion::Repr => value.format_repr(),
            };
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            (text, number.is_some() && spec.kind.is_none())
        }
    };

    let len = text.chars().count();
    if len >= spec.width {
        return text;
    }
    let pad = spec.width - len;
    let align = spec
        .align
        .unwrap_or(if numeric { Align::Right } else { Align::Left });
    let fill = |n: usize| std::iter::repeat(spec.fill).take(n).collect::<String>();
    match align {
        Align::Left => format!("{}{}", text, fill(pad)),
        Align::Right => format!("{}{}", fill(pad), text),
        Align::Center => format!("{}{}{}", fill(pad / 2), text, fill(pad - pad / 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Sample {
        Text(&'static str),
        Num(f64),
    }

    impl Formattable for Sample {
        fn format_str(&self) -> String {
            match self {
                Sample::Text(s) => s.to_string(),
                Sample::Num(n) => n.to_string(),
            }
        }

        fn format_repr(&self) -> String {
            match self {
                Sample::Text(s) => format!("\"{}\"", s),
                Sample::Num(n) => n.to_string(),
            }
        }

        fn as_number(&self) -> Option<f64> {
            match self {
                Sample::Text(_) => None,
                Sample::Num(n) => Some(*n),
            }
        }
    }

    fn render(template: &str) -> String {
        FormatTemplate::parse(template)
            .unwrap()
            .render(|name| -> Result<Sample, ()> {
                Ok(match name {
                    "attr1" => Sample::Text("Hello"),
                    "attr2" => Sample::Text("Goodbye"),
                    "n" => Sample::Num(3.0),
                    _ => Sample::Text("classc"),
                })
            })
            .unwrap()
    }

    #[test]
    fn test_fill_and_align() {
        assert_eq!(
            render("{attr1:*<18} {attr2:*>18}"),
            "Hello************* ***********Goodbye"
        );
        assert_eq!(render("[{attr1:^9}]"), "[  Hello  ]");
    }

    #[test]
    fn test_repr_conversion_and_escapes() {
        assert_eq!(render("{{{attr1!r}}}"), "{\"Hello\"}");
        assert_eq!(render("{class_name}: {attr1}, {attr2}"), "classc: Hello, Goodbye");
    }

    #[test]
    fn test_numeric_specs() {
        assert_eq!(render("{n:4d}"), "   3");
        assert_eq!(render("{n:.2f}"), "3.00");
        assert_eq!(render("{n:<4}|"), "3   |");
    }

    #[test]
    fn test_default_repr() {
        let template = FormatTemplate::default_repr(["attr1", "attr2"]);
        assert_eq!(template.source(), "{class_name}(attr1={attr1!r}, attr2={attr2!r})");
        assert_eq!(
            template.field_names().collect::<Vec<_>>(),
            vec!["class_name", "attr1", "attr2"]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(FormatTemplate::parse("{attr1").is_err());
        assert!(FormatTemplate::parse("attr1}").is_err());
        assert!(FormatTemplate::parse("{}").is_err());
        assert!(FormatTemplate::parse("{a!x}").is_err());
        assert!(FormatTemplate::parse("{a:q}").is_err());
    }
}
