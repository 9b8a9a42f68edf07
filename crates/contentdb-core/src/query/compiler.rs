//! Statement compilation.
//!
//! Compiles a resolved [`Type`] plus query/content state into parameterized
//! select, insert, update, and delete statements. Select compilation walks
//! the relation graph and attaches left joins recursively; a per-query
//! emitted set guarantees each alias is joined once and each select key is
//! emitted once, which is what keeps the `alias__property` row convention
//! unambiguous for hydration.

use std::collections::HashSet;

use tracing::debug;

use super::content_query::{ContentQuery, Predicate};
use super::statement::{Parameters, Statement};
use crate::content::{Content, ContentValue};
use crate::error::Error;
use crate::schema::{Property, Type};
use crate::value::Value;

/// Compiles statements for one resolved content type.
pub struct QueryCompiler<'a> {
    ty: &'a Type,
}

impl<'a> QueryCompiler<'a> {
    /// Create a compiler for a resolved type.
    pub fn new(ty: &'a Type) -> Self {
        Self { ty }
    }

    /// Compile a select statement for the query.
    pub fn select(&self, query: &ContentQuery) -> Result<Statement, Error> {
        let table = &self.ty.table;

        let mut selects = Vec::new();
        let mut joins = Vec::new();
        let mut seen_aliases = HashSet::new();
        seen_aliases.insert(table.clone());
        let mut seen_columns = HashSet::new();
        attach_selects(
            self.ty,
            table,
            &mut selects,
            &mut joins,
            &mut seen_aliases,
            &mut seen_columns,
        )?;

        let mut params = Parameters::new();
        let mut wheres = Vec::new();
        for (name, predicate) in &query.predicates {
            compile_predicate(self.ty, table, name, predicate, true, &mut wheres, &mut params)?;
        }

        let mut sql = format!("SELECT {} FROM {table} AS {table}", selects.join(", "));
        for join in &joins {
            sql.push_str(join);
        }
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }
        if !query.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&query.group_by.join(", "));
        }
        if !query.order_by.is_empty() {
            let order: Vec<String> = query
                .order_by
                .iter()
                .map(|spec| format!("{} {}", spec.field, spec.direction.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if query.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", query.offset));
        }

        debug!(sql = %sql, "compiled select statement");
        Ok(Statement::new(sql, params.into_params()))
    }

    /// Compile an insert statement from the content's current values.
    ///
    /// The autoincrement property is left to the backend. A null value on a
    /// not-null property falls back to the property default, resolved at
    /// this point (deferred generators evaluate here).
    pub fn insert(&self, content: &Content) -> Result<Statement, Error> {
        let mut params = Parameters::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for property in &self.ty.properties {
            if property.auto_increment {
                continue;
            }

            let mut value = database_value(property, content.value(&property.identifier)?)?;
            if value.is_null() && property.not_null {
                if let Some(default) = &property.default {
                    value = default.resolve();
                }
            }

            let bound = coerce_for(property, &value)?;
            columns.push(property.column.clone());
            placeholders.push(params.bind(bound));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.ty.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        debug!(sql = %sql, "compiled insert statement");
        Ok(Statement::new(sql, params.into_params()))
    }

    /// Compile an update statement for the given changes, matched on the
    /// content's current autoincrement value.
    pub fn update(&self, content: &Content, changes: &[(String, Value)]) -> Result<Statement, Error> {
        if changes.is_empty() {
            return Err(Error::EmptyChanges);
        }

        let mut params = Parameters::new();
        let mut sets = Vec::new();
        for (name, value) in changes {
            let property = self.ty.property(name)?;
            let bound = coerce_for(property, value)?;
            sets.push(format!("{} = {}", property.column, params.bind(bound)));
        }

        let auto = self.ty.auto_increment()?;
        let id = coerce_for(auto, &content.auto_id()?)?;
        let placeholder = params.bind(id);

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.ty.table,
            sets.join(", "),
            auto.column,
            placeholder
        );

        debug!(sql = %sql, "compiled update statement");
        Ok(Statement::new(sql, params.into_params()))
    }

    /// Compile a delete statement.
    ///
    /// Without criteria the content's current autoincrement value is the
    /// match; otherwise criteria go through the same predicate grammar as
    /// select, minus relation scoping (DELETE carries no joins).
    pub fn delete(&self, content: &Content, criteria: &[(String, Predicate)]) -> Result<Statement, Error> {
        let table = &self.ty.table;
        let mut params = Parameters::new();
        let mut wheres = Vec::new();

        if criteria.is_empty() {
            let auto = self.ty.auto_increment()?;
            let id = coerce_for(auto, &content.auto_id()?)?;
            let placeholder = params.bind(id);
            wheres.push(format!("{table}.{} = {}", auto.column, placeholder));
        } else {
            for (name, predicate) in criteria {
                compile_predicate(self.ty, table, name, predicate, false, &mut wheres, &mut params)?;
            }
        }

        let sql = format!("DELETE FROM {table} WHERE {}", wheres.join(" AND "));
        debug!(sql = %sql, "compiled delete statement");
        Ok(Statement::new(sql, params.into_params()))
    }
}

/// Recursively emit selects and left joins for a type under an alias.
fn attach_selects(
    ty: &Type,
    alias: &str,
    selects: &mut Vec<String>,
    joins: &mut Vec<String>,
    seen_aliases: &mut HashSet<String>,
    seen_columns: &mut HashSet<String>,
) -> Result<(), Error> {
    for property in &ty.properties {
        match &property.relation {
            None => {
                let key = format!("{alias}__{}", property.identifier);
                if seen_columns.insert(key.clone()) {
                    selects.push(format!("{alias}.{} AS {key}", property.column));
                }
            }
            Some(relation) => {
                if seen_aliases.insert(relation.alias.clone()) {
                    let target =
                        relation
                            .target_property()
                            .ok_or_else(|| Error::MissingProperty {
                                property: relation.property.clone(),
                                type_identifier: relation.target.identifier.clone(),
                            })?;
                    joins.push(format!(
                        " LEFT JOIN {} AS {} ON {alias}.{} = {}.{}",
                        relation.target.table,
                        relation.alias,
                        property.column,
                        relation.alias,
                        target.column
                    ));
                    attach_selects(
                        &relation.target,
                        &relation.alias,
                        selects,
                        joins,
                        seen_aliases,
                        seen_columns,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Compile one predicate into where fragments.
fn compile_predicate(
    ty: &Type,
    alias: &str,
    name: &str,
    predicate: &Predicate,
    relations_allowed: bool,
    wheres: &mut Vec<String>,
    params: &mut Parameters,
) -> Result<(), Error> {
    // Direct property: equality, IN sugar, or relation-scoped map.
    if let Some(property) = ty.get_property(name) {
        return match predicate {
            Predicate::Value(value) => {
                let bound = coerce_for(property, value)?;
                wheres.push(format!(
                    "{alias}.{} = {}",
                    property.column,
                    params.bind(bound)
                ));
                Ok(())
            }
            Predicate::List(values) => {
                compile_in(alias, property, values, false, wheres, params)
            }
            Predicate::Map(entries) => {
                let relation =
                    property
                        .relation
                        .as_ref()
                        .ok_or_else(|| Error::InvalidOperand {
                            predicate: name.to_string(),
                            expected: "a relation property",
                        })?;
                if !relations_allowed {
                    return Err(Error::UnsupportedCriteria {
                        predicate: name.to_string(),
                    });
                }
                for (sub_name, sub_predicate) in entries {
                    compile_predicate(
                        &relation.target,
                        &relation.alias,
                        sub_name,
                        sub_predicate,
                        relations_allowed,
                        wheres,
                        params,
                    )?;
                }
                Ok(())
            }
            Predicate::Raw(_) => Err(Error::InvalidOperand {
                predicate: name.to_string(),
                expected: "a value, list, or relation map",
            }),
        };
    }

    // `column__modifier` grammar. Identifiers never contain `__`, so the
    // first split is the only candidate.
    if let Some((column, modifier)) = name.split_once("__") {
        if let Some(property) = ty.get_property(column) {
            let modifier = modifier.to_ascii_lowercase();
            let comparison = match modifier.as_str() {
                "gt" => Some(">"),
                "gte" => Some(">="),
                "lt" => Some("<"),
                "lte" => Some("<="),
                _ => None,
            };
            if let Some(operator) = comparison {
                let Predicate::Value(value) = predicate else {
                    return Err(Error::InvalidOperand {
                        predicate: name.to_string(),
                        expected: "a scalar value",
                    });
                };
                let bound = coerce_for(property, value)?;
                wheres.push(format!(
                    "{alias}.{} {operator} {}",
                    property.column,
                    params.bind(bound)
                ));
                return Ok(());
            }

            match modifier.as_str() {
                "in" | "notin" => {
                    let Predicate::List(values) = predicate else {
                        return Err(Error::InvalidOperand {
                            predicate: name.to_string(),
                            expected: "a list of values",
                        });
                    };
                    return compile_in(
                        alias,
                        property,
                        values,
                        modifier == "notin",
                        wheres,
                        params,
                    );
                }
                "isnull" => {
                    let Predicate::Value(Value::Bool(wanted)) = predicate else {
                        return Err(Error::InvalidOperand {
                            predicate: name.to_string(),
                            expected: "a boolean",
                        });
                    };
                    let check = if *wanted { "IS NULL" } else { "IS NOT NULL" };
                    wheres.push(format!("{alias}.{} {check}", property.column));
                    return Ok(());
                }
                _ => {
                    // An unknown suffix on a real column is a mistake, not a
                    // raw expression, unless the caller says so explicitly.
                    if !matches!(predicate, Predicate::Raw(_)) {
                        return Err(Error::UnknownModifier {
                            predicate: name.to_string(),
                        });
                    }
                }
            }
        }
    }

    // Raw expression: the key is the SQL, the payload its named binds.
    match predicate {
        Predicate::Raw(binds) => {
            wheres.push(name.to_string());
            for (bind, value) in binds {
                params.bind_named(bind.clone(), value.clone());
            }
            Ok(())
        }
        _ => Err(Error::RawExpressionParams {
            predicate: name.to_string(),
        }),
    }
}

/// Compile an IN / NOT IN predicate.
///
/// Empty operand lists compile to constant predicates instead of invalid
/// empty parenthesized lists.
fn compile_in(
    alias: &str,
    property: &Property,
    values: &[Value],
    negated: bool,
    wheres: &mut Vec<String>,
    params: &mut Parameters,
) -> Result<(), Error> {
    if values.is_empty() {
        wheres.push(if negated { "1 = 1" } else { "1 = 0" }.to_string());
        return Ok(());
    }

    let mut placeholders = Vec::with_capacity(values.len());
    for value in values {
        let bound = coerce_for(property, value)?;
        placeholders.push(params.bind(bound));
    }

    let keyword = if negated { "NOT IN" } else { "IN" };
    wheres.push(format!(
        "{alias}.{} {keyword} ({})",
        property.column,
        placeholders.join(", ")
    ));
    Ok(())
}

/// Coerce a bind value to a property's storage type.
fn coerce_for(property: &Property, value: &Value) -> Result<Value, Error> {
    property
        .storage_type
        .coerce(value)
        .ok_or_else(|| Error::Coercion {
            property: property.identifier.clone(),
            storage_type: property.storage_type.to_string(),
        })
}

/// The value a property contributes to an insert.
///
/// Nested relation values bind the target property's value from the nested
/// content, following relation chains; scalars stand for the bare foreign
/// key.
fn database_value(property: &Property, value: &ContentValue) -> Result<Value, Error> {
    match value {
        ContentValue::Scalar(scalar) => Ok(scalar.clone()),
        ContentValue::Nested(content) => {
            let relation = property
                .relation
                .as_ref()
                .ok_or_else(|| Error::InvalidOperand {
                    predicate: property.identifier.clone(),
                    expected: "a scalar value",
                })?;
            let target = relation
                .target_property()
                .ok_or_else(|| Error::MissingProperty {
                    property: relation.property.clone(),
                    type_identifier: relation.target.identifier.clone(),
                })?;
            database_value(target, content.value(&relation.property)?)
        }
    }
}
