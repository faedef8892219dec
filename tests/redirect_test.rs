mod common;

use assert2::check;
use common::{SAMPLE_VERSION, ScriptedCorpus, sample_module, test_context};
use modsearch::{
    CorpusError, CorpusSnapshot, Experiments, MemoryCorpus, ModuleRecord, RequestContext,
    SearchError, USE_PATH_TABLE, resolve_redirect,
};
use rstest::{fixture, rstest};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// `golang.org/x/tools` with `internal/lsp`, plus the standard library with
/// `cmd/go`, `cmd/go/internal/auth` and `fmt`.
#[fixture]
fn tools_and_std() -> MemoryCorpus {
    let mut corpus = MemoryCorpus::new();
    corpus
        .insert_module(sample_module("golang.org/x/tools", SAMPLE_VERSION, &["internal/lsp"]))
        .unwrap();
    corpus
        .insert_module(sample_module(
            "std",
            SAMPLE_VERSION,
            &["cmd/go", "cmd/go/internal/auth", "fmt"],
        ))
        .unwrap();
    corpus
}

fn context(use_path_table: bool) -> RequestContext {
    let experiments = if use_path_table {
        Experiments::new([USE_PATH_TABLE])
    } else {
        Experiments::none()
    };
    test_context().with_experiments(Arc::new(experiments))
}

#[rstest]
#[case::module("golang.org/x/tools", Some("/mod/golang.org/x/tools"))]
#[case::directory("golang.org/x/tools/internal", Some("/golang.org/x/tools/internal"))]
#[case::package("golang.org/x/tools/internal/lsp", Some("/golang.org/x/tools/internal/lsp"))]
#[case::stdlib_package_not_present("errors", None)]
#[case::stdlib_package_does_redirect("cmd/go", Some("/cmd/go"))]
#[case::stdlib_directory_does_redirect("cmd/go/internal", Some("/cmd/go/internal"))]
#[case::std_does_not_redirect("std", None)]
#[case::bare_stdlib_package_does_not_redirect("fmt", None)]
#[case::non_existent_path("github.com/non-existent", None)]
#[case::above_module_root("golang.org/x", None)]
#[case::partial_element("golang.org/x/tools/intern", None)]
#[case::trailing_slash("golang.org/x/tools/", Some("/mod/golang.org/x/tools"))]
#[case::surrounding_space("  cmd/go/internal/auth ", Some("/cmd/go/internal/auth"))]
#[case::empty("", None)]
#[tokio::test]
async fn search_request_redirect_path(
    tools_and_std: MemoryCorpus,
    #[values(false, true)] use_path_table: bool,
    #[case] query: &str,
    #[case] want: Option<&str>,
) {
    let got = resolve_redirect(&context(use_path_table), &tools_and_std, query)
        .await
        .unwrap();
    check!(
        got.as_deref() == want,
        "resolve_redirect({:?}) with use_path_table={}",
        query,
        use_path_table
    );
}

#[rstest]
#[tokio::test]
async fn strategies_agree_on_every_path(tools_and_std: MemoryCorpus) {
    let mut corpus = tools_and_std;
    // A nested module and a module whose root is also a package.
    corpus
        .insert_module(sample_module(
            "golang.org/x/tools/gopls",
            SAMPLE_VERSION,
            &["", "internal/hooks"],
        ))
        .unwrap();
    corpus
        .insert_module(sample_module("github.com/a/b", SAMPLE_VERSION, &["", "c/d/e"]))
        .unwrap();

    let candidates = [
        "golang.org/x/tools",
        "golang.org/x/tools/gopls",
        "golang.org/x/tools/gopls/internal",
        "golang.org/x/tools/gopls/internal/hooks",
        "golang.org/x/tools/internal",
        "golang.org/x",
        "github.com/a/b",
        "github.com/a/b/c",
        "github.com/a/b/c/d",
        "github.com/a/b/c/d/e",
        "github.com/a/b/c/d/e/f",
        "github.com/a",
        "cmd",
        "cmd/go",
        "cmd/go/internal",
        "cmd/go/internal/auth",
        "cmd/go/internal/auth/x",
    ];

    for query in candidates {
        let live = resolve_redirect(&context(false), &corpus, query).await.unwrap();
        let table = resolve_redirect(&context(true), &corpus, query).await.unwrap();
        check!(live == table, "strategies disagree on {:?}", query);

        // Identical corpus and query give identical results.
        let again = resolve_redirect(&context(false), &corpus, query).await.unwrap();
        check!(live == again);
    }
}

#[rstest]
#[tokio::test]
async fn module_root_package_redirects_to_module_page(
    #[values(false, true)] use_path_table: bool,
) {
    let mut corpus = MemoryCorpus::new();
    corpus
        .insert_module(sample_module("github.com/a/b", SAMPLE_VERSION, &[""]))
        .unwrap();

    let got = resolve_redirect(&context(use_path_table), &corpus, "github.com/a/b")
        .await
        .unwrap();
    check!(got.as_deref() == Some("/mod/github.com/a/b"));
}

#[rstest]
#[tokio::test]
async fn empty_corpus_never_redirects(#[values(false, true)] use_path_table: bool) {
    let corpus = MemoryCorpus::new();
    let got = resolve_redirect(&context(use_path_table), &corpus, "golang.org/x/tools")
        .await
        .unwrap();
    check!(got.is_none());
}

#[rstest]
#[tokio::test]
async fn not_found_from_store_means_no_redirect(#[values(false, true)] use_path_table: bool) {
    let corpus = ScriptedCorpus::failing(CorpusError::NotFound("golang.org/x/tools".into()));
    let got = resolve_redirect(&context(use_path_table), &corpus, "golang.org/x/tools")
        .await
        .unwrap();
    check!(got.is_none());
}

#[rstest]
#[tokio::test]
async fn other_store_errors_propagate(#[values(false, true)] use_path_table: bool) {
    let corpus = ScriptedCorpus::failing(CorpusError::Unavailable("timeout".into()));
    let err = resolve_redirect(&context(use_path_table), &corpus, "golang.org/x/tools")
        .await
        .unwrap_err();
    check!(let SearchError::DataAccess(CorpusError::Unavailable(_)) = err);
    check!(corpus.calls() == 1);
}

#[tokio::test]
async fn bare_identifiers_never_reach_the_store() {
    let corpus = ScriptedCorpus::default();
    for query in ["std", "errors", "fmt", "  "] {
        let got = resolve_redirect(&context(false), &corpus, query).await.unwrap();
        check!(got.is_none());
    }
    check!(corpus.calls() == 0);
}

#[tokio::test]
async fn live_lookups_stop_at_first_hit_order() {
    // With nothing found, the live strategy consults module, package, then directory.
    let corpus = ScriptedCorpus::default();
    let got = resolve_redirect(&context(false), &corpus, "github.com/x/y").await.unwrap();
    check!(got.is_none());
    check!(corpus.calls() == 3);

    let table = ScriptedCorpus::default();
    resolve_redirect(&context(true), &table, "github.com/x/y").await.unwrap();
    check!(table.calls() == 1);
}

#[tokio::test]
async fn cancelled_request_does_not_redirect() {
    let corpus = ScriptedCorpus::hanging();
    let token = CancellationToken::new();
    token.cancel();
    let ctx = context(false).with_cancellation(token);

    let err = resolve_redirect(&ctx, &corpus, "golang.org/x/tools").await.unwrap_err();
    check!(let SearchError::Cancelled = err);
    check!(corpus.calls() == 0);
}

fn write_snapshot(path: &Path, modules: Vec<ModuleRecord>) {
    let snapshot = CorpusSnapshot {
        modules,
        ..CorpusSnapshot::default()
    };
    std::fs::write(path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
}

#[tokio::test]
async fn cached_table_from_another_snapshot_does_not_leak() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_a = dir.path().join("a.json");
    let snapshot_b = dir.path().join("b.json");
    let cache = dir.path().join("paths.table");
    // B is written first, so the cache built from A is newer than B.
    write_snapshot(
        &snapshot_b,
        vec![sample_module("github.com/b/b", SAMPLE_VERSION, &["x"])],
    );
    write_snapshot(
        &snapshot_a,
        vec![sample_module("golang.org/x/tools", SAMPLE_VERSION, &["internal/lsp"])],
    );

    MemoryCorpus::load_with_path_table(&snapshot_a, &cache).unwrap();
    let corpus = MemoryCorpus::load_with_path_table(&snapshot_b, &cache).unwrap();

    for query in [
        "github.com/b/b",
        "github.com/b/b/x",
        "golang.org/x/tools",
        "golang.org/x/tools/internal/lsp",
    ] {
        let live = resolve_redirect(&context(false), &corpus, query).await.unwrap();
        let table = resolve_redirect(&context(true), &corpus, query).await.unwrap();
        check!(live == table, "strategies disagree on {:?}", query);
    }

    let table = resolve_redirect(&context(true), &corpus, "golang.org/x/tools")
        .await
        .unwrap();
    check!(table.is_none());
    let table = resolve_redirect(&context(true), &corpus, "github.com/b/b/x")
        .await
        .unwrap();
    check!(table.as_deref() == Some("/github.com/b/b/x"));
}
