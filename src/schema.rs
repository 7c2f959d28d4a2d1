use serde_json::{json, Map, Value};

/// Small type system for structured model output.
///
/// One description serves two purposes: it renders to the JSON Schema sent
/// to the gateway as tool parameters, and it validates the arguments the
/// gateway sends back.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Text,
    Enum(&'static [&'static str]),
    List {
        items: Box<TypeDef>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(Vec<FieldDef>),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: TypeDef,
    pub description: Option<&'static str>,
}

impl FieldDef {
    pub fn new(name: &'static str, ty: TypeDef) -> Self {
        Self {
            name,
            ty,
            description: None,
        }
    }

    pub fn described(name: &'static str, ty: TypeDef, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description: Some(description),
        }
    }
}

impl TypeDef {
    pub fn list_of(items: TypeDef) -> Self {
        TypeDef::List {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    pub fn exactly(n: usize, items: TypeDef) -> Self {
        TypeDef::List {
            items: Box::new(items),
            min_items: Some(n),
            max_items: Some(n),
        }
    }

    /// Render as JSON Schema. Objects are closed and every field is required.
    pub fn to_json_schema(&self) -> Value {
        match self {
            TypeDef::Text => json!({ "type": "string" }),
            TypeDef::Enum(variants) => json!({ "type": "string", "enum": variants }),
            TypeDef::List {
                items,
                min_items,
                max_items,
            } => {
                let mut schema = Map::new();
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), items.to_json_schema());
                if let Some(min) = min_items {
                    schema.insert("minItems".into(), json!(min));
                }
                if let Some(max) = max_items {
                    schema.insert("maxItems".into(), json!(max));
                }
                Value::Object(schema)
            }
            TypeDef::Object(fields) => {
                let mut properties = Map::new();
                for field in fields {
                    let mut prop = field.ty.to_json_schema();
                    if let (Some(desc), Value::Object(obj)) = (field.description, &mut prop) {
                        obj.insert("description".into(), json!(desc));
                    }
                    properties.insert(field.name.to_string(), prop);
                }
                let required: Vec<&str> = fields.iter().map(|f| f.name).collect();
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                })
            }
        }
    }
}

/// Single schema mismatch, with a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    MissingField {
        path: String,
    },
    UnexpectedField {
        path: String,
    },
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    NotInEnum {
        path: String,
        value: String,
    },
    Cardinality {
        path: String,
        expected: String,
        found: usize,
    },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::MissingField { path } => {
                write!(f, "Missing required field at path {path}")
            }
            SchemaError::UnexpectedField { path } => {
                write!(f, "Field at path {path} is not declared")
            }
            SchemaError::TypeMismatch {
                path,
                expected,
                found,
            } => {
                write!(f, "Type mismatch at {path}: expected {expected}, found {found}")
            }
            SchemaError::NotInEnum { path, value } => {
                write!(f, "Value {value:?} at {path} is not an allowed variant")
            }
            SchemaError::Cardinality {
                path,
                expected,
                found,
            } => {
                write!(f, "Array at {path} has {found} items, expected {expected}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Validate a serde_json::Value against a TypeDef.
///
/// Returns Ok(()) if everything matches, or every mismatch found.
pub fn validate(ty: &TypeDef, value: &Value) -> Result<(), Vec<SchemaError>> {
    let mut errors = Vec::new();
    validate_inner(ty, value, "$", &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_inner(ty: &TypeDef, value: &Value, path: &str, errors: &mut Vec<SchemaError>) {
    match ty {
        TypeDef::Text => {
            if !value.is_string() {
                errors.push(mismatch(path, "string", value));
            }
        }
        TypeDef::Enum(variants) => match value.as_str() {
            Some(s) if variants.contains(&s) => {}
            Some(s) => errors.push(SchemaError::NotInEnum {
                path: path.to_string(),
                value: s.to_string(),
            }),
            None => errors.push(mismatch(path, "string", value)),
        },
        TypeDef::List {
            items,
            min_items,
            max_items,
        } => {
            let Value::Array(elements) = value else {
                errors.push(mismatch(path, "array", value));
                return;
            };
            let too_few = min_items.is_some_and(|min| elements.len() < min);
            let too_many = max_items.is_some_and(|max| elements.len() > max);
            if too_few || too_many {
                errors.push(SchemaError::Cardinality {
                    path: path.to_string(),
                    expected: describe_bounds(*min_items, *max_items),
                    found: elements.len(),
                });
            }
            for (idx, item) in elements.iter().enumerate() {
                validate_inner(items, item, &format!("{path}[{idx}]"), errors);
            }
        }
        TypeDef::Object(fields) => {
            let Some(obj) = value.as_object() else {
                errors.push(mismatch(path, "object", value));
                return;
            };
            for field in fields {
                let field_path = format!("{path}.{}", field.name);
                match obj.get(field.name) {
                    None => errors.push(SchemaError::MissingField { path: field_path }),
                    Some(v) => validate_inner(&field.ty, v, &field_path, errors),
                }
            }
            // Objects are rendered with additionalProperties: false.
            for key in obj.keys() {
                if !fields.iter().any(|f| f.name == key.as_str()) {
                    errors.push(SchemaError::UnexpectedField {
                        path: format!("{path}.{key}"),
                    });
                }
            }
        }
    }
}

fn describe_bounds(min: Option<usize>, max: Option<usize>) -> String {
    match (min, max) {
        (Some(a), Some(b)) if a == b => format!("exactly {a}"),
        (Some(a), Some(b)) => format!("{a}..={b}"),
        (Some(a), None) => format!("at least {a}"),
        (None, Some(b)) => format!("at most {b}"),
        (None, None) => "any".to_string(),
    }
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: value_type_name(found),
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
