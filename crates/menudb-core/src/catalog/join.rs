//! Join descriptors.

/// Kind of SQL join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Inner join; rows without a partner are dropped.
    Inner,
    /// Left outer join; rows without a partner keep nulls.
    Left,
}

impl JoinKind {
    /// SQL keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// One join from an already-introduced alias to a new table alias.
///
/// Renders as `<kind> <table> AS <alias> ON <alias>.<right_column> = <left_alias>.<left_column>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinDef {
    /// Alias introduced by this join. Unique within one entity mapping.
    pub alias: String,
    /// Joined table.
    pub table: String,
    /// Join kind.
    pub kind: JoinKind,
    /// Alias this join hangs off (the root alias or another join's alias).
    pub left_alias: String,
    /// Column on `left_alias`.
    pub left_column: String,
    /// Column on the joined table.
    pub right_column: String,
}

impl JoinDef {
    /// Create a left join.
    pub fn left(
        alias: impl Into<String>,
        table: impl Into<String>,
        left_alias: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
            kind: JoinKind::Left,
            left_alias: left_alias.into(),
            left_column: left_column.into(),
            right_column: right_column.into(),
        }
    }

    /// Create an inner join.
    pub fn inner(
        alias: impl Into<String>,
        table: impl Into<String>,
        left_alias: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        Self {
            kind: JoinKind::Inner,
            ..Self::left(alias, table, left_alias, left_column, right_column)
        }
    }

    /// The alias that must be introduced before this join.
    pub fn depends_on(&self) -> &str {
        &self.left_alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_builders() {
        let join = JoinDef::left("meal", "meals", "recipes", "meal_id", "id");
        assert_eq!(join.kind, JoinKind::Left);
        assert_eq!(join.depends_on(), "recipes");
        assert_eq!(join.kind.keyword(), "LEFT JOIN");

        let join = JoinDef::inner("menu", "menus", "meal", "menu_id", "id");
        assert_eq!(join.kind, JoinKind::Inner);
        assert_eq!(join.depends_on(), "meal");
        assert_eq!(join.table, "menus");
    }
}
