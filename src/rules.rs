//! Declarative tip → lineage matching rules.
//!
//! # Overview
//! Each tip label is mapped to one of four lineages (the outgroup and the
//! three ingroups A, B and C) by a table of [`MatchRule`]s. The table is data:
//! it can be built in code, loaded from TOML, or taken from
//! [`LineageRules::default`], which reproduces the Brassicaceae study
//! (Escherichia outgroup; Brassica, Capsella and Arabidopsis ingroups).
//!
//! # TOML format
//! ```toml
//! [[rule]]
//! lineage = "outgroup"   # outgroup | a | b | c
//! match = "prefix"       # prefix | contains | suffix | exact (default: contains)
//! pattern = "Es_"
//! name = "E. coli"       # optional display name of the lineage
//! ```

use crate::error::{ClassifyError, ConfigError, LineageError};
use crate::tree::{NodeId, Tree};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// The four lineage categories a tip can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lineage {
    Outgroup,
    A,
    B,
    C,
}

impl Lineage {
    pub const ALL: [Lineage; 4] = [Lineage::Outgroup, Lineage::A, Lineage::B, Lineage::C];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lineage::Outgroup => "outgroup",
            Lineage::A => "A",
            Lineage::B => "B",
            Lineage::C => "C",
        };
        f.write_str(name)
    }
}

/// How a rule's pattern is compared against a tip label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Prefix,
    #[default]
    Contains,
    Suffix,
    Exact,
}

/// "A label matching `pattern` belongs to `lineage`."
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchRule {
    pub lineage: Lineage,
    #[serde(rename = "match", default)]
    pub kind: MatchKind,
    pub pattern: String,
    /// Human readable lineage name used in summaries.
    #[serde(default)]
    pub name: Option<String>,
}

impl MatchRule {
    pub fn new(lineage: Lineage, kind: MatchKind, pattern: &str) -> Self {
        MatchRule { lineage, kind, pattern: pattern.to_string(), name: None }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn matches(&self, label: &str) -> bool {
        match self.kind {
            MatchKind::Prefix => label.starts_with(&self.pattern),
            MatchKind::Contains => label.contains(&self.pattern),
            MatchKind::Suffix => label.ends_with(&self.pattern),
            MatchKind::Exact => label == self.pattern,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(rename = "rule", default)]
    rules: Vec<MatchRule>,
}

/// The tips of one tree, one per lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TipAssignment {
    pub outgroup: NodeId,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
}

/// A validated rule table: every lineage has at least one non-empty rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageRules {
    rules: Vec<MatchRule>,
    names: [String; 4],
}

impl Default for LineageRules {
    fn default() -> Self {
        let table = [
            (Lineage::Outgroup, "Es_", "E. coli"),
            (Lineage::A, "Bs_", "B. str"),
            (Lineage::B, "Cr_", "C. rub"),
            (Lineage::C, "At_", "A. tha"),
        ];
        LineageRules {
            rules: table
                .iter()
                .map(|&(lineage, pattern, name)| {
                    MatchRule::new(lineage, MatchKind::Contains, pattern).named(name)
                })
                .collect(),
            names: table.map(|(_, _, name)| name.to_string()),
        }
    }
}

impl LineageRules {
    /// Validates `rules` and builds the table.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyPattern`] for a rule with an empty pattern
    /// - [`ConfigError::MissingLineage`] if a lineage has no rule
    pub fn new(rules: Vec<MatchRule>) -> Result<Self, ConfigError> {
        if let Some(rule) = rules.iter().find(|r| r.pattern.is_empty()) {
            return Err(ConfigError::EmptyPattern(rule.lineage));
        }
        let mut names = Lineage::ALL.map(|l| l.to_string());
        for lineage in Lineage::ALL {
            let for_lineage: Vec<&MatchRule> =
                rules.iter().filter(|r| r.lineage == lineage).collect();
            let Some(first) = for_lineage.first() else {
                return Err(ConfigError::MissingLineage(lineage));
            };
            names[lineage.slot()] = for_lineage
                .iter()
                .find_map(|r| r.name.clone())
                .unwrap_or_else(|| first.pattern.clone());
        }
        Ok(LineageRules { rules, names })
    }

    /// Parses a TOML rule table (see the module docs for the format).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let file: RulesFile = toml::from_str(text)?;
        Self::new(file.rules)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    /// Display name of a lineage: the first `name` given in its rules, or
    /// else the pattern of its first rule.
    pub fn display_name(&self, lineage: Lineage) -> &str {
        &self.names[lineage.slot()]
    }

    pub fn is_outgroup(&self, label: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.lineage == Lineage::Outgroup && r.matches(label))
    }

    /// Lineage of a single label, `None` if no rule matches.
    ///
    /// # Errors
    /// [`LineageError::ConflictingRules`] if rules of two different lineages
    /// match the label.
    pub fn lineage_of(&self, label: &str) -> Result<Option<Lineage>, LineageError> {
        let mut found: Option<Lineage> = None;
        for rule in self.rules.iter().filter(|r| r.matches(label)) {
            match found {
                None => found = Some(rule.lineage),
                Some(first) if first != rule.lineage => {
                    return Err(LineageError::ConflictingRules {
                        label: label.to_string(),
                        first,
                        second: rule.lineage,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(found)
    }

    /// Maps the tips of `tree` onto the four lineages.
    ///
    /// The outgroup is located first; a tree without any outgroup tip fails
    /// with [`ClassifyError::OutgroupNotFound`]. Every other tip must match
    /// exactly one lineage and every lineage must be hit exactly once.
    pub fn assign(&self, tree: &Tree) -> Result<TipAssignment, ClassifyError> {
        if tree.find_tip(|l| self.is_outgroup(l)).is_none() {
            return Err(ClassifyError::OutgroupNotFound);
        }

        let mut slots: [Vec<NodeId>; 4] = Default::default();
        for id in tree.terminals() {
            let label = tree.label(id).unwrap_or_default();
            match self.lineage_of(label)? {
                Some(lineage) => slots[lineage.slot()].push(id),
                None => return Err(LineageError::UnmatchedTip(label.to_string()).into()),
            }
        }

        let mut picked = [0; 4];
        for lineage in Lineage::ALL {
            match slots[lineage.slot()].as_slice() {
                [id] => picked[lineage.slot()] = *id,
                [] => return Err(LineageError::Missing(lineage).into()),
                many => {
                    return Err(LineageError::Duplicate { lineage, count: many.len() }.into());
                }
            }
        }
        let [outgroup, a, b, c] = picked;
        Ok(TipAssignment { outgroup, a, b, c })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_newick;

    fn prefix_rules() -> LineageRules {
        LineageRules::new(vec![
            MatchRule::new(Lineage::Outgroup, MatchKind::Prefix, "Es_"),
            MatchRule::new(Lineage::A, MatchKind::Prefix, "Bs_"),
            MatchRule::new(Lineage::B, MatchKind::Prefix, "Cr_"),
            MatchRule::new(Lineage::C, MatchKind::Prefix, "At_"),
        ])
        .unwrap()
    }

    #[test]
    fn test_match_kinds() {
        let label = "gene12_At_1";
        assert!(MatchRule::new(Lineage::C, MatchKind::Contains, "At_").matches(label));
        assert!(!MatchRule::new(Lineage::C, MatchKind::Prefix, "At_").matches(label));
        assert!(MatchRule::new(Lineage::C, MatchKind::Suffix, "_1").matches(label));
        assert!(MatchRule::new(Lineage::C, MatchKind::Exact, label).matches(label));
        assert!(!MatchRule::new(Lineage::C, MatchKind::Exact, "At_1").matches(label));
    }

    #[test]
    fn test_assign_four_tips() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1)));").unwrap();
        let tips = prefix_rules().assign(&tree).unwrap();
        assert_eq!(tree.label(tips.outgroup), Some("Es_1"));
        assert_eq!(tree.label(tips.a), Some("Bs_1"));
        assert_eq!(tree.label(tips.b), Some("Cr_1"));
        assert_eq!(tree.label(tips.c), Some("At_1"));
    }

    #[test]
    fn test_missing_outgroup() {
        let tree = parse_newick("(Bs_1,(Cr_1,At_1));").unwrap();
        assert_eq!(prefix_rules().assign(&tree), Err(ClassifyError::OutgroupNotFound));
    }

    #[test]
    fn test_missing_and_duplicate_lineage() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,Cr_2)));").unwrap();
        assert_eq!(
            prefix_rules().assign(&tree),
            Err(ClassifyError::LineageAssignment(LineageError::Duplicate {
                lineage: Lineage::B,
                count: 2
            }))
        );

        let tree = parse_newick("(Es_1,(Bs_1,Cr_1));").unwrap();
        assert_eq!(
            prefix_rules().assign(&tree),
            Err(ClassifyError::LineageAssignment(LineageError::Missing(Lineage::C)))
        );
    }

    #[test]
    fn test_unmatched_and_conflicting_tips() {
        let tree = parse_newick("(Es_1,(Bs_1,(Cr_1,At_1),Xx_1));").unwrap();
        assert_eq!(
            prefix_rules().assign(&tree),
            Err(ClassifyError::LineageAssignment(LineageError::UnmatchedTip(
                "Xx_1".to_string()
            )))
        );

        // Contains rules: "Bs_At_1" is claimed by both A and C
        let rules = LineageRules::default();
        assert_eq!(
            rules.lineage_of("Bs_At_1"),
            Err(LineageError::ConflictingRules {
                label: "Bs_At_1".to_string(),
                first: Lineage::A,
                second: Lineage::C,
            })
        );
        assert_eq!(rules.lineage_of("Es_K12"), Ok(Some(Lineage::Outgroup)));
        assert_eq!(rules.lineage_of("Zz_1"), Ok(None));
    }

    #[test]
    fn test_validation() {
        let err = LineageRules::new(vec![
            MatchRule::new(Lineage::Outgroup, MatchKind::Prefix, "Es_"),
            MatchRule::new(Lineage::A, MatchKind::Prefix, "Bs_"),
            MatchRule::new(Lineage::C, MatchKind::Prefix, "At_"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingLineage(Lineage::B)));

        let err = LineageRules::new(vec![MatchRule::new(Lineage::A, MatchKind::Prefix, "")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPattern(Lineage::A)));
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            [[rule]]
            lineage = "outgroup"
            match = "prefix"
            pattern = "Es_"

            [[rule]]
            lineage = "a"
            pattern = "Bs_"
            name = "B. stricta"

            [[rule]]
            lineage = "a"
            pattern = "Br_"

            [[rule]]
            lineage = "b"
            match = "exact"
            pattern = "Capsella"

            [[rule]]
            lineage = "c"
            match = "suffix"
            pattern = "_At"
            name = "A. thaliana"
        "#;
        let rules = LineageRules::from_toml_str(text).unwrap();
        assert_eq!(rules.rules().len(), 5);
        assert_eq!(rules.rules()[1].kind, MatchKind::Contains);
        assert_eq!(rules.display_name(Lineage::A), "B. stricta");
        assert_eq!(rules.display_name(Lineage::B), "Capsella");
        assert_eq!(rules.display_name(Lineage::Outgroup), "Es_");
        assert_eq!(rules.lineage_of("x_Br_2"), Ok(Some(Lineage::A)));
        assert_eq!(rules.lineage_of("gene_At"), Ok(Some(Lineage::C)));
    }

    #[test]
    fn test_from_toml_errors() {
        let missing = "[[rule]]\nlineage = \"a\"\npattern = \"Bs_\"\n";
        assert!(matches!(
            LineageRules::from_toml_str(missing),
            Err(ConfigError::MissingLineage(Lineage::Outgroup))
        ));
        let bad = "[[rule]]\nlineage = \"d\"\npattern = \"Bs_\"\n";
        assert!(matches!(LineageRules::from_toml_str(bad), Err(ConfigError::Toml(_))));
        assert!(matches!(
            LineageRules::from_path("/nonexistent/rules.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_shipped_rules_file_matches_default() {
        let shipped = LineageRules::from_toml_str(include_str!("../rules/brassicaceae.toml")).unwrap();
        assert_eq!(shipped, LineageRules::default());
    }

    #[test]
    fn test_default_names() {
        let rules = LineageRules::default();
        assert_eq!(rules.display_name(Lineage::A), "B. str");
        assert_eq!(rules.display_name(Lineage::B), "C. rub");
        assert_eq!(rules.display_name(Lineage::C), "A. tha");
    }
}
