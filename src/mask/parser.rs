//! Mask string tokenizer.
//!
//! Turns a mask such as `<presenter>/<action>[/<id \d{1,3}>]` or
//! `//<subdomain>.example.com/<presenter>` into a token tree. The
//! grammar:
//!
//! ```text
//! mask      := ['//' host '/'] path ['/']
//! path      := segment ('/' segment)*
//! segment   := part*
//! part      := literal | '<' name [sp regex] [sp default] '>' | '[' path ']'
//! name      := [A-Za-z_][A-Za-z0-9_-]*
//! ```
//!
//! Placeholder bodies are whitespace-split after the name: with two or
//! more trailing tokens the last one is the default and the rest form
//! the regex; with a single token, one containing regex metacharacters
//! is a regex, anything else a default. Optional groups nest. In the
//! host part the textual substitutions `%tld%`, `%domain%` and `%sld%`
//! are recognised as dedicated tokens.

use crate::error::RouterError;

/// One node of the parsed mask tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MaskItem {
    /// Segment separator (top level or inside an optional group)
    Slash,
    /// Literal text, emitted and matched verbatim
    Literal(String),
    /// Named slot with optional regex and default
    Placeholder(PlaceholderSpec),
    /// `[...]` group; nestable
    Optional(Vec<MaskItem>),
    /// `%tld%` / `%domain%` / `%sld%` in a host pattern
    DomainPart(DomainPart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DomainPart {
    Tld,
    Domain,
    Sld,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaceholderSpec {
    pub name: String,
    /// Regex fragment from the mask, if any
    pub pattern: Option<String>,
    /// Inline default from the mask, if any
    pub default: Option<String>,
}

/// Parse result: optional host tree, path tree, trailing-slash flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedMask {
    pub host: Option<Vec<MaskItem>>,
    pub path: Vec<MaskItem>,
    pub trailing_slash: bool,
}

pub(crate) fn parse(mask: &str) -> Result<ParsedMask, RouterError> {
    let (host_part, path_part) = match mask.strip_prefix("//") {
        Some(rest) => match rest.find('/') {
            Some(slash) => (Some(&rest[..slash]), &rest[slash + 1..]),
            None => (Some(rest), ""),
        },
        None => (None, mask),
    };

    let trailing_slash = path_part.ends_with('/');
    let path_part = path_part.strip_suffix('/').unwrap_or(path_part);

    let host = match host_part {
        Some(part) => Some(Parser::new(mask, part, true).run()?),
        None => None,
    };
    let path = Parser::new(mask, path_part, false).run()?;

    Ok(ParsedMask {
        host,
        path,
        trailing_slash,
    })
}

struct Parser<'m> {
    mask: &'m str,
    chars: Vec<char>,
    pos: usize,
    in_host: bool,
}

impl<'m> Parser<'m> {
    fn new(mask: &'m str, input: &str, in_host: bool) -> Self {
        Self {
            mask,
            chars: input.chars().collect(),
            pos: 0,
            in_host,
        }
    }

    fn run(mut self) -> Result<Vec<MaskItem>, RouterError> {
        self.sequence(false)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn error(&self, reason: &str) -> RouterError {
        RouterError::MaskSyntax {
            mask: self.mask.to_string(),
            reason: reason.to_string(),
        }
    }

    fn sequence(&mut self, nested: bool) -> Result<Vec<MaskItem>, RouterError> {
        let mut items = Vec::new();
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            match c {
                '<' => {
                    flush_literal(&mut literal, &mut items);
                    self.pos += 1;
                    items.push(MaskItem::Placeholder(self.placeholder()?));
                }
                '[' => {
                    flush_literal(&mut literal, &mut items);
                    self.pos += 1;
                    let inner = self.sequence(true)?;
                    match self.bump() {
                        Some(']') => items.push(MaskItem::Optional(inner)),
                        _ => return Err(self.error("unbalanced '['")),
                    }
                }
                ']' => {
                    if nested {
                        break;
                    }
                    return Err(self.error("unbalanced ']'"));
                }
                '>' => return Err(self.error("unbalanced '>'")),
                '/' => {
                    flush_literal(&mut literal, &mut items);
                    self.pos += 1;
                    items.push(MaskItem::Slash);
                }
                '%' if self.in_host => {
                    if let Some(part) = self.domain_part() {
                        flush_literal(&mut literal, &mut items);
                        items.push(MaskItem::DomainPart(part));
                    } else {
                        literal.push('%');
                        self.pos += 1;
                    }
                }
                _ => {
                    literal.push(c);
                    self.pos += 1;
                }
            }
        }
        flush_literal(&mut literal, &mut items);
        Ok(items)
    }

    /// Recognise `%tld%` / `%domain%` / `%sld%` at the cursor.
    fn domain_part(&mut self) -> Option<DomainPart> {
        const TOKENS: [(&str, DomainPart); 3] = [
            ("%tld%", DomainPart::Tld),
            ("%domain%", DomainPart::Domain),
            ("%sld%", DomainPart::Sld),
        ];
        for (text, part) in TOKENS {
            let token: Vec<char> = text.chars().collect();
            if self.chars[self.pos..].starts_with(&token) {
                self.pos += token.len();
                return Some(part);
            }
        }
        None
    }

    fn placeholder(&mut self) -> Result<PlaceholderSpec, RouterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '>' {
                break;
            }
            self.pos += 1;
        }
        if self.bump() != Some('>') {
            return Err(self.error("unbalanced '<'"));
        }
        let body: String = self.chars[start..self.pos - 1].iter().collect();
        let tokens: Vec<&str> = body.split_whitespace().collect();

        let Some((&name, rest)) = tokens.split_first() else {
            return Err(self.error("empty placeholder"));
        };
        if !valid_name(name) {
            return Err(self.error(&format!("invalid placeholder name '{}'", name)));
        }

        let (pattern, default) = match rest {
            [] => (None, None),
            [single] => {
                if has_regex_meta(single) {
                    (Some((*single).to_string()), None)
                } else {
                    (None, Some((*single).to_string()))
                }
            }
            [pattern_tokens @ .., default] => {
                (Some(pattern_tokens.join(" ")), Some((*default).to_string()))
            }
        };

        Ok(PlaceholderSpec {
            name: name.to_string(),
            pattern,
            default,
        })
    }
}

fn flush_literal(literal: &mut String, items: &mut Vec<MaskItem>) {
    if !literal.is_empty() {
        items.push(MaskItem::Literal(std::mem::take(literal)));
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn has_regex_meta(token: &str) -> bool {
    token.chars().any(|c| r"\^$.|?*+()[]{}".contains(c))
}
