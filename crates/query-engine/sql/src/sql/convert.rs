//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::string::SQL;

// Convert to SQL strings

impl Script {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Script(statements) = self;
        for (index, statement) in statements.iter().enumerate() {
            if index > 0 {
                sql.append_syntax("\n\n");
            }
            statement.to_sql(sql);
        }
        if !statements.is_empty() {
            sql.append_syntax("\n");
        }
    }
}

impl Statement {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Statement::Comment(text) => {
                for (index, line) in text.lines().enumerate() {
                    if index > 0 {
                        sql.append_syntax("\n");
                    }
                    sql.append_syntax("-- ");
                    sql.append_syntax(line);
                }
            }
            Statement::DropTableIfExists(table) => {
                sql.append_syntax("DROP TABLE IF EXISTS ");
                table.to_sql(sql);
                sql.append_syntax(";");
            }
            Statement::CreateTemporaryTableAs { table, query } => {
                sql.append_syntax("CREATE TEMPORARY TABLE ");
                table.to_sql(sql);
                sql.append_syntax(" AS\n(");
                sql.append_block(&query_to_sql(query));
                sql.append_syntax(");");
            }
            Statement::CreateTemporaryTable { table, columns } => {
                sql.append_syntax("CREATE TEMPORARY TABLE ");
                table.to_sql(sql);
                sql.append_syntax("\n(");
                let mut body = SQL::new();
                for (index, column) in columns.iter().enumerate() {
                    if index > 0 {
                        body.append_syntax(",\n");
                    }
                    column.to_sql(&mut body);
                }
                sql.append_block(&body);
                sql.append_syntax(");");
            }
            Statement::InsertSelect(insert) => insert.to_sql(sql),
            Statement::CreateIndex { table, columns } => {
                sql.append_syntax("CREATE INDEX ON ");
                table.to_sql(sql);
                sql.append_syntax(" (");
                column_names_to_sql(columns, sql);
                sql.append_syntax(");");
            }
            Statement::Analyze(table) => {
                sql.append_syntax("ANALYZE ");
                table.to_sql(sql);
                sql.append_syntax(";");
            }
            Statement::CopyTo(copy) => copy.to_sql(sql),
        }
    }
}

impl ColumnDefinition {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.name.to_sql(sql);
        sql.append_syntax(" ");
        self.r#type.to_sql(sql);
    }
}

impl InsertSelect {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("INSERT INTO ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        column_names_to_sql(&self.columns, sql);
        sql.append_syntax(")\n");
        self.select.to_sql(sql);
        sql.append_syntax(";");
    }
}

impl CopyTo {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("COPY(");
        sql.append_block(&query_to_sql(&self.query));
        sql.append_syntax(")\nTO ");
        sql.append_string_literal(&self.filename);
        sql.append_syntax(" CSV");
        if self.options.header {
            sql.append_syntax(" HEADER");
        }
        sql.append_syntax("\nDELIMITER E'\\t'\nENCODING ");
        sql.append_string_literal(&self.options.encoding);
        sql.append_syntax(";");
    }
}

impl Query {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Query::Select(select) => select.to_sql(sql),
            Query::UnionAll { selects, order_by } => {
                for (index, select) in selects.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax("\nUNION ALL\n");
                    }
                    let mut member = SQL::new();
                    select.to_sql(&mut member);
                    sql.append_syntax("(");
                    sql.append_block(&member);
                    sql.append_syntax(")");
                }
                if !order_by.elements.is_empty() {
                    sql.append_syntax("\n");
                    order_by.to_sql(sql);
                }
            }
        }
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SelectList(select_list) = self;
        let mut columns = SQL::new();
        for (index, (col, expr)) in select_list.iter().enumerate() {
            if index > 0 {
                columns.append_syntax(",\n");
            }
            expr.to_sql(&mut columns);
            columns.append_syntax(" AS ");
            col.to_sql(&mut columns);
        }
        sql.append_block(&columns);
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT");

        // the select list ends with a newline
        self.select_list.to_sql(sql);

        let mut clauses: Vec<SQL> = vec![];

        if let Some(from) = &self.from {
            let mut clause = SQL::new();
            from.to_sql(&mut clause);
            clauses.push(clause);
        }

        for join in &self.joins {
            let mut clause = SQL::new();
            join.to_sql(&mut clause);
            clauses.push(clause);
        }

        if !self.order_by.elements.is_empty() {
            let mut clause = SQL::new();
            self.order_by.to_sql(&mut clause);
            clauses.push(clause);
        }

        if let Some(limit) = self.limit.limit {
            clauses.push(SQL {
                sql: format!("LIMIT {limit}"),
            });
        }

        if clauses.is_empty() {
            if sql.sql.ends_with('\n') {
                sql.sql.pop();
            }
            return;
        }

        let clauses: Vec<String> = clauses.into_iter().map(|clause| clause.sql).collect();
        sql.append_syntax(&clauses.join("\n"));
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { query, alias } => {
                sql.append_syntax("(");
                sql.append_block(&query_to_sql(query));
                sql.append_syntax(") AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        let join = match self {
            Join::LeftOuterJoin(join) => {
                sql.append_syntax("LEFT JOIN ");
                join
            }
            Join::InnerJoin(join) => {
                sql.append_syntax("JOIN ");
                join
            }
        };
        join.reference.to_sql(sql);
        sql.append_syntax(" AS ");
        join.alias.to_sql(sql);
        sql.append_syntax(" ON ");
        join.on.to_sql(sql);
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    arg.to_sql(sql);
                    if index < (args.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::RowNumber { order_by } => {
                sql.append_syntax("row_number() OVER (");
                order_by.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Cast { expression, r#type } => {
                sql.append_syntax("CAST(");
                expression.to_sql(sql);
                sql.append_syntax(" AS ");
                r#type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::RawSql(raw) => sql.append_syntax(raw),
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Coalesce => sql.append_syntax("coalesce"),
            Function::Concat => sql.append_syntax("concat"),
            Function::ConcatWs => sql.append_syntax("concat_ws"),
            Function::Unknown(name) => sql.append_syntax(name),
        }
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::String(s) => sql.append_string_literal(s),
            Value::Null => sql.append_syntax("NULL"),
        }
    }
}

impl ScalarType {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ScalarType(name) = self;
        sql.append_syntax(name);
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable { schema, table } => {
                if let Some(SchemaName(schema)) = schema {
                    sql.append_identifier(schema);
                    sql.append_syntax(".");
                }
                let TableName(table) = table;
                sql.append_identifier(table);
            }
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        };
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self.unique_index {
            None => sql.append_identifier(&self.name),
            Some(index) => sql.append_identifier(&format!("{}_{}", self.name, index)),
        }
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ColumnName(name) = self;
        sql.append_identifier(name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::AliasedColumn { table, column } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                column.to_sql(sql);
            }
            ColumnReference::OutputColumn(column) => column.to_sql(sql),
        };
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl OrderBy {
    /// Renders `ORDER BY ..` without any leading whitespace. Callers check for emptiness.
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("ORDER BY ");
        for (index, order_by_item) in self.elements.iter().enumerate() {
            order_by_item.to_sql(sql);
            if index < (self.elements.len() - 1) {
                sql.append_syntax(", ");
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
    }
}

fn column_names_to_sql(columns: &[ColumnName], sql: &mut SQL) {
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            sql.append_syntax(", ");
        }
        column.to_sql(sql);
    }
}

/// Render a query on its own, to be embedded as an indented block.
pub fn query_to_sql(query: &Query) -> SQL {
    let mut sql = SQL::new();
    query.to_sql(&mut sql);
    sql
}

/// Render a single statement.
pub fn statement_to_sql(statement: &Statement) -> SQL {
    let mut sql = SQL::new();
    statement.to_sql(&mut sql);
    sql
}

/// Render a batch of statements.
pub fn script_to_sql(script: &Script) -> SQL {
    let mut sql = SQL::new();
    script.to_sql(&mut sql);
    sql
}
