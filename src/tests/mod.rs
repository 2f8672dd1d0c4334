use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::aggregate::{
    aggregate, TrackingConfig, DEFAULT_MENTIONS, DEFAULT_TAGS, NOT_FOUND_PAGE,
};
use crate::figma::{ClientOptions, Comment, Page, TOKEN_HEADER};
use crate::filter::{evaluate, FilterCriteria};
use crate::runner::{Options, Runner, RunnerError};

fn sample_comments() -> Vec<Comment> {
    vec![
        Comment::new("1", "Emily Salvador, revisar #componentes", "dana").on_node("n1"),
        Comment::new("2", "Gutierres, ajuste os #ESTILOS aqui", "marco").on_node("n2"),
        Comment::new("3", "#auto_layout sem dono", "zoe").on_node("gone"),
        Comment::new("4", "jheny nunes #prototipo #variaveis", "Dana")
            .resolved("2024-01-02T00:00:00Z"),
    ]
}

fn sample_pages() -> Vec<Page> {
    vec![Page::new("n1", "Home"), Page::new("n2", "Checkout")]
}

#[test]
fn one_row_per_comment_in_order() {
    let comments = sample_comments();
    let agg = aggregate(&comments, &sample_pages(), &TrackingConfig::default());
    assert_eq!(agg.rows.len(), comments.len());
    let ids: Vec<&str> = agg.rows.iter().map(|r| r.comment.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(agg.rows[2].page_name, NOT_FOUND_PAGE);
    assert_eq!(agg.rows[3].page_name, NOT_FOUND_PAGE);
}

#[test]
fn totals_match_sum_of_tag_hits() {
    let agg = aggregate(&sample_comments(), &sample_pages(), &TrackingConfig::default());
    let totals = &agg.total_tag_counters;
    assert_eq!(totals.len(), DEFAULT_TAGS.len());
    assert_eq!(totals.get("componentes"), Some(1));
    assert_eq!(totals.get("estilos"), Some(1));
    assert_eq!(totals.get("auto_layout"), Some(1));
    assert_eq!(totals.get("prototipo"), Some(1));
    assert_eq!(totals.get("variaveis"), Some(1));

    assert_eq!(agg.mention_counters.get("jheny nunes", "prototipo"), Some(1));
    assert_eq!(agg.mention_counters.get("jheny nunes", "variaveis"), Some(1));
    assert_eq!(agg.mention_counters.get("jheny nunes", "auto_layout"), Some(0));
    for person in DEFAULT_MENTIONS {
        assert!(agg.mention_counters.person(person).is_some());
    }
}

#[test]
fn filter_dimensions_against_aggregated_rows() {
    let agg = aggregate(&sample_comments(), &sample_pages(), &TrackingConfig::default());

    let all = evaluate(&agg.rows, &FilterCriteria::default());
    assert_eq!(all.visible_count, agg.rows.len());

    let by_author = evaluate(
        &agg.rows,
        &FilterCriteria {
            author_substring: "dana".to_string(),
            ..FilterCriteria::default()
        },
    );
    assert_eq!(by_author.visibility, vec![true, false, false, true]);

    let by_page = evaluate(
        &agg.rows,
        &FilterCriteria {
            page_id: "n2".to_string(),
            ..FilterCriteria::default()
        },
    );
    assert_eq!(by_page.visible_count, 1);
    assert!(by_page.visibility[1]);
}

async fn mount_file(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/files/KEY"))
        .and(header(TOKEN_HEADER, "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Loja Online",
            "document": {"id": "0:0", "type": "DOCUMENT", "children": [
                {"id": "n1", "name": "Home", "type": "CANVAS"},
                {"id": "n2", "name": "Checkout", "type": "CANVAS"}
            ]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn runner_loads_aggregates_and_filters() {
    let server = MockServer::start().await;
    mount_file(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/files/KEY/comments"))
        .and(header(TOKEN_HEADER, "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "comments": [
                {"id": "1", "message": "Gutierres #estilos", "user": {"handle": "dana"},
                 "created_at": "2024-05-01T10:00:00Z", "resolved_at": null,
                 "client_meta": {"node_id": "n2", "node_offset": {"x": 0, "y": 0}}},
                {"id": "2", "user": {"handle": "broken"}, "created_at": "2024-05-01T10:00:00Z"},
                {"id": "3", "message": "posição solta", "user": {"handle": "zoe"},
                 "created_at": "2024-05-02T10:00:00Z", "client_meta": {"x": 1.5, "y": 2.5}}
            ]
        })))
        .mount(&server)
        .await;

    let runner = Runner::new(Options {
        token: "tok".to_string(),
        file_key: "KEY".to_string(),
        client: ClientOptions {
            api_base: format!("{}/v1/", server.uri()),
            timeout_seconds: 5,
            proxy: None,
        },
        criteria: FilterCriteria {
            page_id: "Checkout".to_string(),
            ..FilterCriteria::default()
        },
        ..Options::default()
    })
    .unwrap();

    let insights = runner.run().await.unwrap();
    assert_eq!(insights.project_name, "Loja Online");
    assert_eq!(insights.total_count(), 2);
    assert_eq!(insights.aggregation.skipped.len(), 1);
    assert_eq!(insights.aggregation.skipped[0].id, "2");
    assert_eq!(insights.criteria.page_id, "n2");
    assert_eq!(insights.visible_count(), 1);
    assert_eq!(insights.visible_rows()[0].page_name, "Checkout");
    assert_eq!(insights.aggregation.rows[1].page_name, NOT_FOUND_PAGE);
    assert_eq!(
        insights
            .aggregation
            .mention_counters
            .get("gutierres", "estilos"),
        Some(1)
    );
}

#[tokio::test]
async fn runner_reports_unavailable_data_on_http_error() {
    let server = MockServer::start().await;
    mount_file(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/files/KEY/comments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let runner = Runner::new(Options {
        token: "tok".to_string(),
        file_key: "KEY".to_string(),
        client: ClientOptions {
            api_base: format!("{}/v1", server.uri()),
            timeout_seconds: 5,
            proxy: None,
        },
        ..Options::default()
    })
    .unwrap();

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, RunnerError::Fetch { .. }));
    assert!(err.to_string().starts_with("design data unavailable"));
}
