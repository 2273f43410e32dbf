use core::fmt;

use crate::node::{Node, NodeKind};
use crate::tree::Tree;

#[derive(Clone, Debug)]
pub struct StringTreeOptions<'a> {
    pub variable_names: Option<&'a [String]>,
    /// Significant digits for leaf values; `None` prints the shortest round-trip form.
    pub precision: Option<usize>,
}

impl Default for StringTreeOptions<'_> {
    fn default() -> Self {
        Self {
            variable_names: None,
            precision: Some(4),
        }
    }
}

pub fn default_string_variable(feature: u16, names: Option<&[String]>) -> String {
    if let Some(names) = names {
        if let Some(name) = names.get(usize::from(feature)) {
            return name.clone();
        }
    }
    format!("x{}", u32::from(feature))
}

fn format_value(v: f64, precision: Option<usize>) -> String {
    match precision {
        Some(p) => {
            let s = format!("{v:.p$}");
            if s.contains('.') {
                s.trim_end_matches('0').trim_end_matches('.').to_string()
            } else {
                s
            }
        }
        None => v.to_string(),
    }
}

fn strip_outer_parens(mut s: &str) -> &str {
    loop {
        let bytes = s.as_bytes();
        if bytes.len() < 2 || bytes[0] != b'(' || bytes[bytes.len() - 1] != b')' {
            return s;
        }

        let mut depth = 0i32;
        let mut encloses_all = false;
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        encloses_all = i == bytes.len() - 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if encloses_all {
            s = &s[1..s.len() - 1];
            continue;
        }

        return s;
    }
}

fn leaf_string(n: &Node, opts: &StringTreeOptions<'_>) -> String {
    let value = format_value(n.value, opts.precision);
    match n.kind {
        NodeKind::Constant => value,
        _ => {
            let name = default_string_variable(n.feature, opts.variable_names);
            if n.value == 1.0 {
                name
            } else {
                format!("({value} * {name})")
            }
        }
    }
}

pub fn string_tree(tree: &Tree, opts: StringTreeOptions<'_>) -> String {
    let mut stack: Vec<String> = Vec::with_capacity(tree.len());

    for n in tree.nodes() {
        if n.is_leaf() {
            stack.push(leaf_string(n, &opts));
            continue;
        }
        let start = stack.len() - n.arity as usize;
        let out = match n.kind.infix() {
            Some(tok) => format!("({} {} {})", stack[start], tok, stack[start + 1]),
            None => format!("{}({})", n.kind.name(), strip_outer_parens(&stack[start])),
        };
        stack.truncate(start);
        stack.push(out);
    }

    assert_eq!(stack.len(), 1);
    strip_outer_parens(&stack[0]).to_string()
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&string_tree(self, StringTreeOptions::default()))
    }
}
