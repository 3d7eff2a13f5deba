use serde_json::Value as JsonValue;

/// Field arguments as provided by the parsed operation, by name.
pub type Arguments = serde_json::Map<String, JsonValue>;

/// One requested field in a parsed query: its name, arguments, and the
/// sub-fields requested on its result (empty for scalar leaves). The tree
/// is immutable once execution starts.
#[derive(Debug, Clone)]
pub struct QueryShapeNode {
    pub name: String,
    pub arguments: Arguments,
    pub children: Vec<QueryShapeNode>,
}

impl QueryShapeNode {
    pub fn field(name: impl Into<String>) -> Self {
        QueryShapeNode {
            name: name.into(),
            arguments: Arguments::new(),
            children: Vec::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn select(mut self, children: impl IntoIterator<Item = QueryShapeNode>) -> Self {
        self.children.extend(children);
        self
    }
}
