use elif_relations::{
    canonicalize, AggregateFunction, ComparisonOperator, DatabaseRow, DatabaseRowExt, Field, JoinType,
    Migration, Model, ModelError, ModelResult, OrderDirection, QueryBuilder, Siblings, SiblingsRelation,
    SiblingsSchema, SqlCast,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Article {
    id: i64,
    title: String,
    #[serde(skip)]
    related: Siblings<Article>,
}

impl Article {
    const ID: Field<Article, i64> = Field::new("id");
    const TITLE: Field<Article, String> = Field::new("title");

    fn related_mut(&mut self) -> &mut Siblings<Article> {
        &mut self.related
    }
}

impl Model for Article {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "articles"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "title"]
    }

    fn primary_key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            related: Siblings::default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Citation {
    id: i64,
    citing_id: i64,
    cited_id: i64,
    weight: i32,
}

impl Citation {
    const CITING: Field<Citation, i64> = Field::new("citing_id");
    const CITED: Field<Citation, i64> = Field::new("cited_id");
    const WEIGHT: Field<Citation, i32> = Field::new("weight");
}

impl Model for Citation {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "citations"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "citing_id", "cited_id", "weight"]
    }

    fn primary_key(&self) -> Option<i64> {
        Some(self.id)
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            citing_id: row.get("citing_id")?,
            cited_id: row.get("cited_id")?,
            weight: row.get("weight")?,
        })
    }
}

fn related() -> SiblingsRelation<Article, Citation> {
    SiblingsRelation::declare("related", Citation::CITING, Citation::CITED, Article::related_mut).unwrap()
}

#[test]
fn test_typed_join_order_and_aggregate() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let sql = QueryBuilder::<Article>::for_model()
        .select_field(Article::TITLE)
        .aggregate(AggregateFunction::Sum, Citation::WEIGHT, Some(SqlCast::BigInt), "total_weight")
        .join_on(JoinType::Left, Article::ID, ComparisonOperator::Equal, Citation::CITED)
        .group_by_field(Article::TITLE)
        .order_by_field(Article::TITLE, OrderDirection::Asc)
        .to_sql();

    assert_eq!(
        sql,
        "SELECT articles.title, CAST(SUM(CAST(citations.weight AS BIGINT)) AS BIGINT) AS total_weight \
         FROM articles LEFT JOIN citations ON articles.id = citations.cited_id \
         GROUP BY articles.title ORDER BY articles.title ASC"
    );
}

#[test]
fn test_edges_query_matches_either_column() {
    let sql = related().edges_query(&[1, 2]).to_sql();

    assert_eq!(
        sql,
        "SELECT citations.citing_id, citations.cited_id FROM citations \
         WHERE (citations.citing_id IN (1, 2) OR citations.cited_id IN (1, 2))"
    );
}

#[test]
fn test_field_validation_is_checked_at_declaration() {
    let unknown: Field<Citation, i64> = Field::new("source_id");
    assert!(unknown.validate().is_err());
    assert!(Citation::CITED.validate().is_ok());

    let err = SiblingsRelation::<Article, Citation>::declare("related", unknown, Citation::CITED, Article::related_mut)
        .unwrap_err();
    assert!(matches!(err, ModelError::Configuration(_)));
}

#[test]
fn test_join_table_schema_uses_key_type() {
    let schema = SiblingsSchema::for_relation(&related());
    let statements = schema.prepare();

    assert!(statements[0].contains("citing_id BIGINT NOT NULL"));
    assert!(statements[0].contains("cited_id BIGINT NOT NULL"));
    assert!(statements[0].contains("FOREIGN KEY (cited_id) REFERENCES articles (id) ON DELETE CASCADE"));
    assert!(statements[0].contains("UNIQUE (citing_id, cited_id)"));
    assert!(statements[0].contains("CHECK (citing_id <> cited_id)"));
    assert!(!statements[0].contains("created_at"));
    assert_eq!(schema.revert(), vec!["DROP TABLE IF EXISTS citations;".to_string()]);
}

#[test]
fn test_canonical_pair_is_order_independent() {
    let forward = canonicalize(9i64, 4).unwrap();
    let backward = canonicalize(4i64, 9).unwrap();

    assert_eq!(forward, backward);
    assert_eq!((*forward.left(), *forward.right()), (4, 9));
    assert!(matches!(canonicalize(4i64, 4), Err(ModelError::InvalidEdge(_))));
}

#[test]
fn test_fresh_models_start_unloaded() {
    let article = Article {
        id: 1,
        title: "Graphs".to_string(),
        related: Siblings::default(),
    };
    assert!(matches!(article.related.neighbors(), Err(ModelError::NotLoaded(_))));
}
