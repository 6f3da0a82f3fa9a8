//! Encoding laws for every endpoint parameter struct.

use std::time::Duration;

use assert2::check;
use osprey::api::cat::{CatHealthParams, CatIndicesParams};
use osprey::api::cluster::ClusterHealthParams;
use osprey::api::document::{DocumentDeleteParams, DocumentGetParams, DocumentIndexParams};
use osprey::api::indices::{
    IndicesCreateParams, IndicesDeleteParams, IndicesExistsParams, IndicesRefreshParams,
};
use osprey::api::reindex::{ReindexParams, RethrottleParams};
use osprey::api::root::RootParams;
use osprey::api::search::SearchParams;
use osprey::{
    ByteUnit, CommonParams, DefaultOperator, EncodeParams, ExpandWildcards, HealthLevel,
    HealthStatus, OpType, ParamMap, Params, Refresh, SearchType, VersionType, WaitForActiveShards,
};

/// Encoded map of a parameter struct.
fn encoded(params: &impl EncodeParams) -> ParamMap {
    params.encode()
}

fn assert_single(params: &impl EncodeParams, key: &str, value: &str) {
    let map = encoded(params);
    check!(map.len() == 1, "{key}: {map:?}");
    check!(map.get(key) == Some(value));
}

#[test]
fn defaults_encode_to_nothing() {
    check!(encoded(&RootParams::default()).is_empty());
    check!(encoded(&IndicesCreateParams::default()).is_empty());
    check!(encoded(&IndicesDeleteParams::default()).is_empty());
    check!(encoded(&IndicesExistsParams::default()).is_empty());
    check!(encoded(&IndicesRefreshParams::default()).is_empty());
    check!(encoded(&DocumentIndexParams::default()).is_empty());
    check!(encoded(&DocumentGetParams::default()).is_empty());
    check!(encoded(&DocumentDeleteParams::default()).is_empty());
    check!(encoded(&SearchParams::default()).is_empty());
    check!(encoded(&CatHealthParams::default()).is_empty());
    check!(encoded(&CatIndicesParams::default()).is_empty());
    check!(encoded(&ClusterHealthParams::default()).is_empty());
    check!(encoded(&ReindexParams::default()).is_empty());
    check!(encoded(&RethrottleParams::default()).is_empty());
}

#[test]
fn one_option_encodes_one_entry() {
    assert_single(
        &RootParams {
            common: CommonParams {
                human: true,
                ..CommonParams::default()
            },
        },
        "human",
        "true",
    );
    assert_single(
        &IndicesCreateParams {
            wait_for_active_shards: WaitForActiveShards::Count(2),
            ..IndicesCreateParams::default()
        },
        "wait_for_active_shards",
        "2",
    );
    assert_single(
        &IndicesDeleteParams {
            expand_wildcards: Some(ExpandWildcards::OPEN),
            ..IndicesDeleteParams::default()
        },
        "expand_wildcards",
        "open",
    );
    assert_single(
        &IndicesExistsParams {
            expand_wildcards: ExpandWildcards::OPEN | ExpandWildcards::HIDDEN,
            ..IndicesExistsParams::default()
        },
        "expand_wildcards",
        "open,hidden",
    );
    assert_single(
        &IndicesRefreshParams {
            ignore_unavailable: Some(true),
            ..IndicesRefreshParams::default()
        },
        "ignore_unavailable",
        "true",
    );
    assert_single(
        &DocumentIndexParams {
            version_type: VersionType::ExternalGte,
            ..DocumentIndexParams::default()
        },
        "version_type",
        "external_gte",
    );
    assert_single(
        &DocumentGetParams {
            source_excludes: vec!["body".to_string(), "raw".to_string()],
            ..DocumentGetParams::default()
        },
        "_source_excludes",
        "body,raw",
    );
    assert_single(
        &DocumentDeleteParams {
            if_seq_no: Some(0),
            ..DocumentDeleteParams::default()
        },
        "if_seq_no",
        "0",
    );
    assert_single(
        &SearchParams {
            search_type: SearchType::DfsQueryThenFetch,
            ..SearchParams::default()
        },
        "search_type",
        "dfs_query_then_fetch",
    );
    assert_single(
        &CatHealthParams {
            ts: Some(false),
            ..CatHealthParams::default()
        },
        "ts",
        "false",
    );
    assert_single(
        &CatIndicesParams {
            bytes: Some(ByteUnit::Kb),
            ..CatIndicesParams::default()
        },
        "bytes",
        "kb",
    );
    assert_single(
        &ClusterHealthParams {
            level: HealthLevel::Shards,
            ..ClusterHealthParams::default()
        },
        "level",
        "shards",
    );
    assert_single(
        &ReindexParams {
            scroll: Some(Duration::from_secs(300)),
            ..ReindexParams::default()
        },
        "scroll",
        "5m",
    );
    assert_single(
        &RethrottleParams {
            requests_per_second: Some(12.5),
            ..RethrottleParams::default()
        },
        "requests_per_second",
        "12.5",
    );
}

#[test]
fn boundary_values_are_omitted() {
    let params = SearchParams {
        sort: Vec::new(),
        timeout: Some(Duration::ZERO),
        q: Some(String::new()),
        typed_keys: false,
        default_operator: DefaultOperator::Or,
        ..SearchParams::default()
    };
    check!(encoded(&params).is_empty());
}

#[test]
fn explicit_false_is_kept_for_tristate_flags() {
    let params = ClusterHealthParams {
        local: Some(false),
        wait_for_status: Some(HealthStatus::Yellow),
        ..ClusterHealthParams::default()
    };
    let map = encoded(&params);
    check!(map.get("local") == Some("false"));
    check!(map.get("wait_for_status") == Some("yellow"));
}

#[test]
fn encode_parse_encode_is_stable() {
    let params = DocumentIndexParams {
        refresh: Refresh::WaitFor,
        op_type: OpType::Create,
        routing: Some("user 1/2".to_string()),
        timeout: Some(Duration::from_millis(1500)),
        pipeline: Some("geo&ip".to_string()),
        common: CommonParams {
            filter_path: vec!["_id".to_string(), "result".to_string()],
            ..CommonParams::default()
        },
        ..DocumentIndexParams::default()
    };

    let first = encoded(&params);
    let parsed = ParamMap::parse_query(&first.to_query_string());
    check!(parsed == first);
    check!(encoded(&params) == first);
}

#[test]
fn search_query_string() {
    let params = SearchParams {
        q: Some("title:dune".to_string()),
        from: Some(20),
        size: Some(10),
        expand_wildcards: Some(ExpandWildcards::ALL),
        timeout: Some(Duration::from_millis(750)),
        common: CommonParams {
            pretty: true,
            ..CommonParams::default()
        },
        ..SearchParams::default()
    };

    insta::assert_snapshot!(
        encoded(&params).to_query_string(),
        @"expand_wildcards=all&from=20&pretty=true&q=title%3Adune&size=10&timeout=750ms"
    );
}

#[derive(Debug, Default, Params)]
#[param(rename_all = "camelCase")]
struct PluginParams {
    max_docs: Option<u64>,
    #[param(rename = "q")]
    query_string: Option<String>,
    #[param(skip)]
    #[allow(dead_code)]
    local_only: bool,
    #[param(flatten)]
    common: CommonParams,
}

#[test]
fn derive_works_outside_the_crate() {
    let params = PluginParams {
        max_docs: Some(5),
        query_string: Some("x".to_string()),
        local_only: true,
        common: CommonParams {
            error_trace: true,
            ..CommonParams::default()
        },
    };
    let map = encoded(&params);
    check!(map.get("maxDocs") == Some("5"));
    check!(map.get("q") == Some("x"));
    check!(map.get("error_trace") == Some("true"));
    check!(map.len() == 3);
}
