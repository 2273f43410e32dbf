use anyhow::bail;

/// A column named either by header or by 0-based position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSelector {
    Name(String),
    Index(usize),
}

impl ColumnSelector {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let s = raw.trim();
        if s.is_empty() {
            bail!("empty column selector");
        }
        if let Ok(idx) = s.parse::<usize>() {
            return Ok(Self::Index(idx));
        }
        Ok(Self::Name(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_by_position() {
        assert_eq!(ColumnSelector::parse(" 2 ").unwrap(), ColumnSelector::Index(2));
        assert_eq!(ColumnSelector::parse("x2").unwrap(), ColumnSelector::Name("x2".into()));
        assert!(ColumnSelector::parse("  ").is_err());
    }
}
