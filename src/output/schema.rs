//! Arrow schema inference and JSON to Arrow conversion
//!
//! Schemas are inferred incrementally so a batch can be scanned once for its
//! schema and once more for its rows, without holding every record at once.

use crate::error::{Error, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray,
    StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Incremental schema inference over a stream of JSON records
///
/// Columns keep the order in which their keys were first seen. Conflicting
/// types widen: null gives way to anything, integers widen to floats, structs
/// and lists merge recursively, and any other conflict falls back to strings.
#[derive(Debug, Clone, Default)]
pub struct SchemaInference {
    fields: Vec<(String, DataType)>,
    positions: HashMap<String, usize>,
    records: usize,
}

impl SchemaInference {
    /// Start with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the schema
    pub fn observe(&mut self, record: &Value) {
        self.records += 1;
        let Value::Object(obj) = record else {
            return;
        };

        for (key, value) in obj {
            let inferred = infer_type(value);
            match self.positions.get(key) {
                Some(&idx) => {
                    let merged = merge_types(&self.fields[idx].1, &inferred);
                    self.fields[idx].1 = merged;
                }
                None => {
                    self.positions.insert(key.clone(), self.fields.len());
                    self.fields.push((key.clone(), inferred));
                }
            }
        }
    }

    /// Number of records observed
    pub fn records_seen(&self) -> usize {
        self.records
    }

    /// Produce the final schema
    ///
    /// Types that cannot be stored (all-null columns, empty structs) become
    /// strings. Every field is nullable.
    pub fn finish(self) -> Schema {
        let fields: Vec<Field> = self
            .fields
            .into_iter()
            .map(|(name, dtype)| Field::new(name, finalize_type(dtype), true))
            .collect();
        Schema::new(fields)
    }
}

/// Infer an Arrow schema from a set of JSON records
pub fn infer_schema(records: &[Value]) -> Result<Schema> {
    let mut inference = SchemaInference::new();
    for record in records {
        inference.observe(record);
    }
    Ok(inference.finish())
}

/// Merge two schemas, combining fields from both
pub fn merge_schemas(schema1: &Schema, schema2: &Schema) -> Schema {
    let fields = merge_fields(schema1.fields(), schema2.fields());
    Schema::new(fields)
}

/// Convert JSON records to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data. Values that do not
/// fit their column's type become nulls, except in string columns where they
/// are stored as JSON text.
pub fn json_to_arrow(records: &[Value], schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(records)?,
    };
    let schema = Arc::new(schema);

    if records.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(obj) => obj.get(field.name()),
                _ => None,
            })
            .collect();

        columns.push(build_array(&values, field.data_type())?);
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(arr) => {
            let element_type = arr
                .iter()
                .map(infer_type)
                .reduce(|a, b| merge_types(&a, &b))
                .unwrap_or(DataType::Null);
            list_of(element_type)
        }
        Value::Object(obj) => {
            let fields: Vec<Field> = obj
                .iter()
                .map(|(k, v)| Field::new(k, infer_type(v), true))
                .collect();
            DataType::Struct(Fields::from(fields))
        }
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::List(a), DataType::List(b)) => {
            list_of(merge_types(a.data_type(), b.data_type()))
        }

        (DataType::Struct(a), DataType::Struct(b)) => DataType::Struct(merge_fields(a, b)),

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Merge two field lists by name, keeping the order of first appearance
fn merge_fields(a: &Fields, b: &Fields) -> Fields {
    let mut merged: Vec<Field> = a.iter().map(|f| f.as_ref().clone()).collect();

    for field in b {
        match merged.iter_mut().find(|existing| existing.name() == field.name()) {
            Some(existing) => {
                let dtype = merge_types(existing.data_type(), field.data_type());
                *existing = Field::new(field.name(), dtype, true);
            }
            None => merged.push(field.as_ref().clone()),
        }
    }

    Fields::from(merged)
}

/// Replace types that cannot be written with strings
fn finalize_type(dtype: DataType) -> DataType {
    match dtype {
        DataType::Null => DataType::Utf8,
        DataType::List(item) => list_of(finalize_type(item.data_type().clone())),
        DataType::Struct(fields) if fields.is_empty() => DataType::Utf8,
        DataType::Struct(fields) => {
            let fields: Vec<Field> = fields
                .iter()
                .map(|f| Field::new(f.name(), finalize_type(f.data_type().clone()), true))
                .collect();
            DataType::Struct(Fields::from(fields))
        }
        other => other,
    }
}

fn list_of(item: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", item, true)))
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    // JSON null and a missing key are the same thing in a column
    let values: Vec<Option<&Value>> = values
        .iter()
        .map(|v| v.filter(|v| !v.is_null()))
        .collect();

    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(&values, field),

        DataType::Struct(fields) => build_struct_array(&values, fields),

        _ => {
            // Fall back to string representation
            let arr: StringArray = values.iter().map(|v| v.map(ToString::to_string)).collect();
            Ok(Arc::new(arr))
        }
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        if let Some(Value::Array(arr)) = value {
            all_items.extend(arr.iter().map(Some));
            validity.push(true);
        } else {
            validity.push(false);
        }
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::output("Array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let list_array = ListArray::try_new(
        Arc::clone(field),
        OffsetBuffer::new(offsets.into()),
        items_array,
        null_buffer(validity),
    )?;
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let child_values: Vec<Option<&Value>> = values
            .iter()
            .map(|v| match v {
                Some(Value::Object(obj)) => obj.get(field.name()),
                _ => None,
            })
            .collect();

        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let validity: Vec<bool> = values
        .iter()
        .map(|v| matches!(v, Some(Value::Object(_))))
        .collect();

    let struct_array = StructArray::try_new(fields.clone(), child_arrays, null_buffer(validity))?;
    Ok(Arc::new(struct_array))
}

fn null_buffer(validity: Vec<bool>) -> Option<NullBuffer> {
    if validity.iter().all(|valid| *valid) {
        None
    } else {
        Some(NullBuffer::from(validity))
    }
}

/// Convert an Arrow RecordBatch to JSON records
///
/// Returns a vector of JSON objects, one per row in the batch.
pub fn arrow_to_json(batch: &RecordBatch) -> Result<Vec<Value>> {
    let schema = batch.schema();
    let num_rows = batch.num_rows();
    let mut records = Vec::with_capacity(num_rows);

    for row_idx in 0..num_rows {
        let mut record = serde_json::Map::new();

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let column = batch.column(col_idx);
            let value = array_value_to_json(column.as_ref(), row_idx)?;
            record.insert(field.name().clone(), value);
        }

        records.push(Value::Object(record));
    }

    Ok(records)
}

/// Convert a single array element to JSON
fn array_value_to_json(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),

        DataType::Boolean => Ok(Value::Bool(downcast::<BooleanArray>(array)?.value(row))),

        DataType::Int64 => Ok(Value::Number(downcast::<Int64Array>(array)?.value(row).into())),

        DataType::Float64 => {
            let val = downcast::<Float64Array>(array)?.value(row);
            Ok(serde_json::Number::from_f64(val).map_or(Value::Null, Value::Number))
        }

        DataType::Utf8 => Ok(Value::String(
            downcast::<StringArray>(array)?.value(row).to_string(),
        )),

        DataType::List(_) => {
            let values = downcast::<ListArray>(array)?.value(row);
            let mut items = Vec::with_capacity(values.len());
            for i in 0..values.len() {
                items.push(array_value_to_json(values.as_ref(), i)?);
            }
            Ok(Value::Array(items))
        }

        DataType::Struct(_) => {
            let arr = downcast::<StructArray>(array)?;
            let mut obj = serde_json::Map::new();
            for (i, field) in arr.fields().iter().enumerate() {
                let val = array_value_to_json(arr.column(i).as_ref(), row)?;
                obj.insert(field.name().clone(), val);
            }
            Ok(Value::Object(obj))
        }

        other => Ok(Value::String(format!("{other:?}"))),
    }
}

fn downcast<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::output(format!(
            "Failed to downcast {:?} array",
            array.data_type()
        ))
    })
}
