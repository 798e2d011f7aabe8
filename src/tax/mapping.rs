// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use std::collections::BTreeMap;

use super::placeholders;
use crate::errors::Result;
use crate::models::{CategoryTaxMapping, TaxForm};

/// The single form/line a multi-mapped category reports under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedMapping {
    pub tax_form_code: String,
    pub line_item: String,
}

impl CollapsedMapping {
    /// `"{form label}: {line item}"`, falling back to the raw code for forms
    /// this crate does not know.
    pub fn source_label(&self) -> String {
        match self.tax_form_code.parse::<TaxForm>() {
            Ok(form) => format!("{}: {}", form.label(), self.line_item),
            Err(_) => format!("{}: {}", self.tax_form_code, self.line_item),
        }
    }
}

/// How to pick one mapping for a category mapped several times, so its
/// transactions are counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MappingCollapse {
    /// Lexically smallest form code and, independently, lexically smallest
    /// line item. The pair need not exist as a single mapping row.
    #[default]
    LexicalMin,
}

impl MappingCollapse {
    pub fn collapse(&self, mappings: &[CategoryTaxMapping]) -> BTreeMap<i64, CollapsedMapping> {
        match self {
            MappingCollapse::LexicalMin => lexical_min(mappings),
        }
    }
}

fn lexical_min(mappings: &[CategoryTaxMapping]) -> BTreeMap<i64, CollapsedMapping> {
    let mut out: BTreeMap<i64, CollapsedMapping> = BTreeMap::new();
    for m in mappings {
        out.entry(m.category_id)
            .and_modify(|c| {
                if m.tax_form_code < c.tax_form_code {
                    c.tax_form_code = m.tax_form_code.clone();
                }
                if m.line_item < c.line_item {
                    c.line_item = m.line_item.clone();
                }
            })
            .or_insert_with(|| CollapsedMapping {
                tax_form_code: m.tax_form_code.clone(),
                line_item: m.line_item.clone(),
            });
    }
    out
}

pub fn load_mappings(conn: &Connection, forms: &[TaxForm]) -> Result<Vec<CategoryTaxMapping>> {
    let codes: Vec<&str> = forms.iter().map(TaxForm::code).collect();
    let sql = format!(
        "SELECT id, category_id, tax_form_code, line_item, country
         FROM category_tax_mappings WHERE tax_form_code IN ({}) ORDER BY id",
        placeholders(codes.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(codes.iter()), |r| {
        Ok(CategoryTaxMapping {
            id: r.get(0)?,
            category_id: r.get(1)?,
            tax_form_code: r.get(2)?,
            line_item: r.get(3)?,
            country: r.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: i64, category_id: i64, form: &str, line: &str) -> CategoryTaxMapping {
        CategoryTaxMapping {
            id,
            category_id,
            tax_form_code: form.into(),
            line_item: line.into(),
            country: "ES".into(),
        }
    }

    #[test]
    fn lexical_min_collapses_each_column_independently() {
        let mappings = vec![
            m(1, 7, "IRPFForeignIncome", "0029"),
            m(2, 7, "IRPF", "0033"),
            m(3, 8, "IRPFCapitalGains", "0328"),
        ];
        let collapsed = MappingCollapse::LexicalMin.collapse(&mappings);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(
            collapsed[&7],
            CollapsedMapping {
                tax_form_code: "IRPF".into(),
                line_item: "0029".into()
            }
        );
        assert_eq!(collapsed[&7].source_label(), "IRPF: 0029");
        assert_eq!(collapsed[&8].source_label(), "IRPF Capital Gains: 0328");
    }

    #[test]
    fn unknown_form_codes_label_with_raw_code() {
        let c = CollapsedMapping {
            tax_form_code: "Modelo100".into(),
            line_item: "x".into(),
        };
        assert_eq!(c.source_label(), "Modelo100: x");
    }
}
