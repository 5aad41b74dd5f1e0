//! Type definitions of a SQL AST representation.

use nonempty::NonEmpty;

/// A batch of statements, rendered one after the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Script(pub Vec<Statement>);

/// A single top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A `--` comment line, emitted to document the batch.
    Comment(String),
    /// DROP TABLE IF EXISTS
    DropTableIfExists(TableReference),
    /// CREATE TEMPORARY TABLE .. AS (query)
    CreateTemporaryTableAs {
        table: TableReference,
        query: Query,
    },
    /// CREATE TEMPORARY TABLE with explicit column definitions
    CreateTemporaryTable {
        table: TableReference,
        columns: Vec<ColumnDefinition>,
    },
    /// INSERT INTO .. (columns) SELECT ..
    InsertSelect(InsertSelect),
    /// CREATE INDEX ON table (columns)
    CreateIndex {
        table: TableReference,
        columns: Vec<ColumnName>,
    },
    /// ANALYZE table
    Analyze(TableReference),
    /// COPY (query) TO 'file'
    CopyTo(CopyTo),
}

/// A column definition inside a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: ColumnName,
    pub r#type: ScalarType,
}

/// An INSERT INTO .. SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSelect {
    pub table: TableReference,
    pub columns: Vec<ColumnName>,
    pub select: Select,
}

/// A server-side bulk export of a query result to a file.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyTo {
    pub query: Query,
    pub filename: String,
    pub options: CopyOptions,
}

/// Output format of a COPY TO statement. Always tab-delimited CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    pub header: bool,
    pub encoding: String,
}

/// A query: either a single SELECT or a union of SELECTs.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Box<Select>),
    /// UNION ALL of selects, keeping duplicates. Each member is parenthesised
    /// so it can carry its own ORDER BY and LIMIT.
    UnionAll {
        selects: NonEmpty<Select>,
        order_by: OrderBy,
    },
}

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: Option<From>,
    pub joins: Vec<Join>,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectList(pub Vec<(ColumnAlias, Expression)>);

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum From {
    /// Select from a table reference
    Table {
        reference: TableReference,
        alias: TableAlias,
    },
    /// Select from a subquery
    Select {
        query: Box<Query>,
        alias: TableAlias,
    },
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// LEFT OUTER JOIN
    LeftOuterJoin(TableJoin),
    /// INNER JOIN
    InnerJoin(TableJoin),
}

/// A join against a table with an ON condition.
#[derive(Debug, Clone, PartialEq)]
pub struct TableJoin {
    pub reference: TableReference,
    pub alias: TableAlias,
    pub on: Expression,
}

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause, always ascending
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
}

/// A LIMIT clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u32>,
}

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// AND clause
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A binary operation on two scalar expression
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// `row_number() OVER (ORDER BY ..)`
    RowNumber { order_by: OrderBy },
    /// A column reference
    ColumnReference(ColumnReference),
    /// An irreducible value
    Value(Value),
    Cast {
        expression: Box<Expression>,
        r#type: ScalarType,
    },
    /// Raw SQL written by a user which is opaque to us
    RawSql(String),
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equals,
}

/// A scalar function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Coalesce,
    Concat,
    ConcatWs,
    Unknown(String),
}

/// Value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Null,
}

/// Scalar type name, such as `text` or `double precision`.
/// This is output verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType(pub String);

/// A database schema name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(pub String);

/// A database table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A reference to a table. Used when we want to query it,
/// for example in a FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableReference {
    /// refers to a db table object name
    DBTable {
        schema: Option<SchemaName>,
        table: TableName,
    },
    /// refers to an alias we created
    AliasedTable(TableAlias),
}

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column. Used when we want to query it,
/// for example in a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// refers to a db column object name
    TableColumn {
        table: TableReference,
        name: ColumnName,
    },
    /// refers to a column of a subquery we aliased
    AliasedColumn {
        table: TableReference,
        column: ColumnAlias,
    },
    /// refers to an output column of the enclosing query, as in
    /// the ORDER BY of a union
    OutputColumn(ColumnAlias),
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    pub unique_index: Option<u64>,
    pub name: String,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
