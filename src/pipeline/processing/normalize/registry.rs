use crate::types::TableId;

/// How a coerced numeric column is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// Always real.
    Real,
    /// Integer when every value is whole, real otherwise.
    Inferred,
}

/// A single table-specific cleaning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Replace null or empty cells with a literal. The column must exist.
    FillMissing {
        column: &'static str,
        value: &'static str,
    },
    /// Uppercase every text cell. The column must exist.
    Uppercase { column: &'static str },
    /// If the column exists, coerce it to numbers (unparseable becomes 0) and rename it.
    CoerceNumeric {
        column: &'static str,
        rename_to: &'static str,
        kind: NumericKind,
    },
    /// Remove rows where any of these columns is null or empty. The columns must exist.
    DropMissing { columns: &'static [&'static str] },
}

const USERS_RULES: &[Rule] = &[
    Rule::FillMissing {
        column: "STATE",
        value: "UNKNOWN",
    },
    Rule::Uppercase { column: "STATE" },
    Rule::FillMissing {
        column: "GENDER",
        value: "unknown",
    },
    Rule::FillMissing {
        column: "LANGUAGE",
        value: "unknown",
    },
];

const TRANSACTIONS_RULES: &[Rule] = &[
    Rule::CoerceNumeric {
        column: "FINAL_SALE",
        rename_to: "SALE",
        kind: NumericKind::Real,
    },
    Rule::CoerceNumeric {
        column: "FINAL_QUANTITY",
        rename_to: "QUANTITY",
        kind: NumericKind::Inferred,
    },
    Rule::DropMissing {
        columns: &["USER_ID", "BARCODE"],
    },
];

const PRODUCTS_RULES: &[Rule] = &[Rule::FillMissing {
    column: "CATEGORY_1",
    value: "UNKNOWN",
}];

/// Ordered table-specific rules, applied after the shared trimming, date and barcode steps.
pub fn rules_for(table: TableId) -> &'static [Rule] {
    match table {
        TableId::Users => USERS_RULES,
        TableId::Transactions => TRANSACTIONS_RULES,
        TableId::Products => PRODUCTS_RULES,
    }
}
