use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use fieldline_engine::{
    context::ExecutionContext,
    execution::OperationKind,
    query::QueryShapeNode,
    response::QueryResponse,
    source::{DataSource, SourceError},
};

use crate::Catalog;

/// In-memory catalog fixture mirroring the REST service's data shapes.
struct FixtureCatalogSource {
    tracks: Vec<JsonValue>,
    authors: HashMap<String, JsonValue>,
    modules: HashMap<String, Vec<JsonValue>>,
    mutation_failure: Option<SourceError>,
}

impl FixtureCatalogSource {
    fn new() -> Self {
        FixtureCatalogSource {
            tracks: Vec::new(),
            authors: HashMap::new(),
            modules: HashMap::new(),
            mutation_failure: None,
        }
    }

    fn with_track(mut self, track: JsonValue) -> Self {
        self.tracks.push(track);
        self
    }

    fn with_author(mut self, id: &str, author: JsonValue) -> Self {
        self.authors.insert(id.to_string(), author);
        self
    }

    fn with_modules(mut self, track_id: &str, modules: Vec<JsonValue>) -> Self {
        self.modules.insert(track_id.to_string(), modules);
        self
    }

    fn with_mutation_failure(mut self, failure: SourceError) -> Self {
        self.mutation_failure = Some(failure);
        self
    }

    fn track_by_id(&self, id: &str) -> Option<&JsonValue> {
        self.tracks
            .iter()
            .find(|track| track.get("id").and_then(|v| v.as_str()) == Some(id))
    }
}

#[async_trait]
impl DataSource for FixtureCatalogSource {
    async fn fetch_home_collection(&self) -> Result<Vec<JsonValue>, SourceError> {
        Ok(self.tracks.clone())
    }

    async fn fetch_by_id(&self, kind: &str, id: &str) -> Result<JsonValue, SourceError> {
        let record = match kind {
            "track" => self.track_by_id(id).cloned(),
            "author" => self.authors.get(id).cloned(),
            _ => None,
        };
        record.ok_or_else(|| SourceError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        })
    }

    async fn fetch_related(
        &self,
        _kind: &str,
        parent_id: &str,
    ) -> Result<Vec<JsonValue>, SourceError> {
        Ok(self.modules.get(parent_id).cloned().unwrap_or_default())
    }

    async fn mutate_counter_field(
        &self,
        kind: &str,
        id: &str,
        field_name: &str,
    ) -> Result<JsonValue, SourceError> {
        if let Some(failure) = &self.mutation_failure {
            return Err(failure.clone());
        }
        let mut record = self.fetch_by_id(kind, id).await?;
        let views = record.get(field_name).and_then(|v| v.as_i64()).unwrap_or(0);
        record[field_name] = JsonValue::from(views + 1);
        Ok(record)
    }
}

fn context_for(source: FixtureCatalogSource) -> ExecutionContext {
    ExecutionContext::new(Arc::new(source))
}

fn serialized(response: &QueryResponse) -> String {
    serde_json::to_string(response).unwrap()
}

#[test]
fn track_by_id_assembles_nested_author() {
    let catalog = Catalog::build().unwrap();
    let ctx = context_for(
        FixtureCatalogSource::new()
            .with_track(json!({"id": "42", "title": "Intro", "authorId": "7"}))
            .with_author("7", json!({"id": "7", "name": "Ada"})),
    );
    let selection = vec![QueryShapeNode::field("track")
        .arg("id", json!("42"))
        .select([
            QueryShapeNode::field("id"),
            QueryShapeNode::field("title"),
            QueryShapeNode::field("author").select([QueryShapeNode::field("name")]),
        ])];
    tokio_test::block_on(async {
        let response = catalog.execute(&ctx, &selection, OperationKind::Query).await;
        assert!(response.errors.is_empty());
        insta::assert_snapshot!(
            serialized(&response),
            @r#"{"data":{"track":{"id":"42","title":"Intro","author":{"name":"Ada"}}}}"#
        );
    });
}

#[test]
fn tracks_for_home_resolves_authors_and_modules_in_order() {
    let catalog = Catalog::build().unwrap();
    let ctx = context_for(
        FixtureCatalogSource::new()
            .with_track(json!({"id": "1", "title": "Cat-stronomy", "authorId": "a1", "modulesCount": 2}))
            .with_track(json!({"id": "2", "title": "Famous Catstronauts", "authorId": "a2", "modulesCount": 1}))
            .with_author("a1", json!({"id": "a1", "name": "Henri"}))
            .with_author("a2", json!({"id": "a2", "name": "Grumpy"}))
            .with_modules(
                "1",
                vec![
                    json!({"id": "m1", "title": "Orbits", "length": 10}),
                    json!({"id": "m2", "title": "Landings", "length": 15}),
                ],
            )
            .with_modules("2", vec![json!({"id": "m3", "title": "Archives", "length": 5})]),
    );
    let selection = vec![QueryShapeNode::field("tracksForHome").select([
        QueryShapeNode::field("id"),
        QueryShapeNode::field("title"),
        QueryShapeNode::field("author").select([QueryShapeNode::field("name")]),
        QueryShapeNode::field("modules").select([QueryShapeNode::field("title")]),
    ])];
    tokio_test::block_on(async {
        let response = catalog.execute(&ctx, &selection, OperationKind::Query).await;
        assert!(response.errors.is_empty());
        assert_eq!(
            serialized(&response),
            concat!(
                r#"{"data":{"tracksForHome":["#,
                r#"{"id":"1","title":"Cat-stronomy","author":{"name":"Henri"},"modules":[{"title":"Orbits"},{"title":"Landings"}]},"#,
                r#"{"id":"2","title":"Famous Catstronauts","author":{"name":"Grumpy"},"modules":[{"title":"Archives"}]}"#,
                r#"]}}"#
            )
        );
    });
}

#[test]
fn increment_track_views_failure_becomes_envelope() {
    let catalog = Catalog::build().unwrap();
    let ctx = context_for(FixtureCatalogSource::new().with_mutation_failure(
        SourceError::Upstream {
            status: 404,
            body: "not found".to_string(),
        },
    ));
    let selection = vec![QueryShapeNode::field("incrementTrackViews")
        .arg("id", json!("99"))
        .select([
            QueryShapeNode::field("code"),
            QueryShapeNode::field("success"),
            QueryShapeNode::field("message"),
            QueryShapeNode::field("track").select([QueryShapeNode::field("id")]),
        ])];
    tokio_test::block_on(async {
        let response = catalog
            .execute(&ctx, &selection, OperationKind::Mutation)
            .await;
        assert!(response.errors.is_empty());
        assert_eq!(
            serialized(&response),
            concat!(
                r#"{"data":{"incrementTrackViews":"#,
                r#"{"code":404,"success":false,"message":"not found","track":null}}}"#
            )
        );
    });
}

#[test]
fn increment_track_views_success_carries_updated_track() {
    let catalog = Catalog::build().unwrap();
    let ctx = context_for(
        FixtureCatalogSource::new()
            .with_track(json!({"id": "5", "title": "Intro", "authorId": "7", "numberOfViews": 10})),
    );
    let selection = vec![QueryShapeNode::field("incrementTrackViews")
        .arg("id", json!("5"))
        .select([
            QueryShapeNode::field("code"),
            QueryShapeNode::field("success"),
            QueryShapeNode::field("message"),
            QueryShapeNode::field("track").select([
                QueryShapeNode::field("id"),
                QueryShapeNode::field("numberOfViews"),
            ]),
        ])];
    tokio_test::block_on(async {
        let response = catalog
            .execute(&ctx, &selection, OperationKind::Mutation)
            .await;
        assert!(response.errors.is_empty());
        assert_eq!(
            serialized(&response),
            concat!(
                r#"{"data":{"incrementTrackViews":{"code":200,"success":true,"#,
                r#""message":"Successfully incremented number of views for track 5","#,
                r#""track":{"id":"5","numberOfViews":11}}}}"#
            )
        );
    });
}

#[test]
fn repeated_queries_yield_identical_trees() {
    let catalog = Catalog::build().unwrap();
    let ctx = context_for(
        FixtureCatalogSource::new()
            .with_track(json!({"id": "42", "title": "Intro", "authorId": "7"}))
            .with_author("7", json!({"id": "7", "name": "Ada"})),
    );
    let selection = vec![QueryShapeNode::field("track")
        .arg("id", json!("42"))
        .select([
            QueryShapeNode::field("id"),
            QueryShapeNode::field("author").select([QueryShapeNode::field("name")]),
        ])];
    tokio_test::block_on(async {
        let first = catalog.execute(&ctx, &selection, OperationKind::Query).await;
        let second = catalog.execute(&ctx, &selection, OperationKind::Query).await;
        assert_eq!(serialized(&first), serialized(&second));
    });
}
