// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Flat column schemas.
//!
//! This writer supports a single group of leaf columns: every column is a
//! `REQUIRED`, `OPTIONAL` or `REPEATED` primitive directly under the schema
//! root. Nested groups are out of scope.

use crate::basic::{ConvertedType, Repetition, Type};
use crate::errors::Result;

/// Definition of one leaf column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    physical_type: Type,
    repetition: Repetition,
    /// Fixed width in bytes; meaningful only for `FIXED_LEN_BYTE_ARRAY`
    /// columns and for reserving inline space in sink records.
    type_length: i32,
    converted_type: Option<ConvertedType>,
}

impl ColumnDef {
    /// Creates a column of the given physical type.
    pub fn new(name: impl Into<String>, physical_type: Type, repetition: Repetition) -> Self {
        Self {
            name: name.into(),
            physical_type,
            repetition,
            type_length: 0,
            converted_type: None,
        }
    }

    /// Sets the fixed width for `FIXED_LEN_BYTE_ARRAY` columns.
    pub fn with_type_length(mut self, type_length: i32) -> Self {
        self.type_length = type_length;
        self
    }

    /// Annotates the column with a converted type.
    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = Some(converted_type);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn physical_type(&self) -> Type {
        self.physical_type
    }

    pub fn repetition(&self) -> Repetition {
        self.repetition
    }

    pub fn type_length(&self) -> i32 {
        self.type_length
    }

    pub fn converted_type(&self) -> Option<ConvertedType> {
        self.converted_type
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(schema_err!("column names must not be empty"));
        }
        if self.physical_type == Type::FIXED_LEN_BYTE_ARRAY && self.type_length <= 0 {
            return Err(schema_err!(
                "column {} is FIXED_LEN_BYTE_ARRAY and needs a positive type length, got {}",
                self.name,
                self.type_length
            ));
        }
        Ok(())
    }
}

/// A validated, ordered set of leaf columns.
///
/// The order is fixed at construction and determines the order of column
/// chunks within every row group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    columns: Vec<ColumnDef>,
}

impl SchemaDescriptor {
    /// Validates the column list and builds a descriptor.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        if columns.is_empty() {
            return Err(schema_err!("schemas must contain at least one column"));
        }
        for column in &columns {
            column.validate()?;
        }
        Ok(Self { columns })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &ColumnDef {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParquetFlowError;

    #[test]
    fn test_minimal_schema() {
        let schema = SchemaDescriptor::new(vec![ColumnDef::new(
            "ts",
            Type::INT64,
            Repetition::REQUIRED,
        )])
        .unwrap();
        assert_eq!(schema.num_columns(), 1);
        assert_eq!(schema.column(0).name(), "ts");
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(
            SchemaDescriptor::new(vec![]),
            Err(ParquetFlowError::Schema(_))
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = SchemaDescriptor::new(vec![ColumnDef::new("", Type::INT32, Repetition::REQUIRED)]);
        assert!(matches!(err, Err(ParquetFlowError::Schema(_))));
    }

    #[test]
    fn test_fixed_len_needs_length() {
        let missing = SchemaDescriptor::new(vec![ColumnDef::new(
            "sym",
            Type::FIXED_LEN_BYTE_ARRAY,
            Repetition::REQUIRED,
        )]);
        assert!(missing.is_err());

        let ok = SchemaDescriptor::new(vec![ColumnDef::new(
            "sym",
            Type::FIXED_LEN_BYTE_ARRAY,
            Repetition::REQUIRED,
        )
        .with_type_length(8)]);
        assert_eq!(ok.unwrap().column(0).type_length(), 8);
    }

    #[test]
    fn test_converted_type_annotation() {
        let column = ColumnDef::new("name", Type::BYTE_ARRAY, Repetition::OPTIONAL)
            .with_converted_type(ConvertedType::UTF8);
        assert_eq!(column.converted_type(), Some(ConvertedType::UTF8));
    }
}
