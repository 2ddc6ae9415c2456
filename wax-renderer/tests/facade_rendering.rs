use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wax_core::{
    CompileOptions, Engine, FileRecord, KeyGen, Module, Namespace, Overrides, ReduceContext,
    RenderOptions, Source, WaxConfig, WaxError,
};
use wax_renderer::{CallOptions, Decorator, Helper, TemplateInput, TeraEngine, Wax};

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn raw() -> CompileOptions {
    CompileOptions {
        no_escape: Some(true),
        ..Default::default()
    }
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "partials/header.tera", "<h1>{{ site }}</h1>");
    write(root, "partials/nav/menu.main.tera", "[{% for item in nav %}{{ item }}{% if not loop.last %},{% endif %}{% endfor %}]");
    write(root, "partials/notes.txt", "ignored");
    write(root, "data/site.json", r#"{"site": "S", "nav": ["home", "about"]}"#);
    write(root, "data/author.yaml", "author: Ann\n");
    write(root, "pages/index.tera", "{% include \"header\" %}{{ title }}");
    dir
}

fn wax_at(dir: &TempDir) -> Wax<TeraEngine> {
    Wax::tera(WaxConfig::at(dir.path()).compile_options(raw()))
}

// ---------------------------------------------------------------------------
// 1. Context merging
// ---------------------------------------------------------------------------

#[test]
fn shared_context_and_call_data_merge_with_back_reference() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.data(Namespace::from([("site".to_string(), json!("S"))])).unwrap();

    let page = wax
        .compile("{{ title }}|{{ site }}|{{ _parent.site }}|{{ _data.global.site }}|{{ _data.local.title }}")
        .unwrap();
    let out = wax.render(&page, &json!({ "title": "T" })).unwrap();
    assert_eq!(out, "T|S|S|S|T");
}

#[test]
fn call_data_wins_over_shared_context() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.data(Namespace::from([("title".to_string(), json!("shared"))])).unwrap();
    let page = wax.compile("{{ title }}/{{ _parent.title }}").unwrap();
    assert_eq!(wax.render(&page, &json!({ "title": "mine" })).unwrap(), "mine/shared");
}

#[test]
fn data_registered_after_compile_is_visible() {
    let dir = site();
    let mut wax = wax_at(&dir);
    let page = wax.compile("{{ site | default(value=\"none\") }}").unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "none");

    wax.data(Namespace::from([("site".to_string(), json!("late"))])).unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "late");
}

#[test]
fn independent_facades_do_not_share_context() {
    let dir = site();
    let mut a = wax_at(&dir);
    let mut b = wax_at(&dir);
    a.data(Namespace::from([("who".to_string(), json!("a"))])).unwrap();
    b.data(Namespace::from([("who".to_string(), json!("b"))])).unwrap();

    let pa = a.compile("{{ who }}").unwrap();
    let pb = b.compile("{{ who }}").unwrap();
    assert_eq!(a.render(&pa, &json!({})).unwrap(), "a");
    assert_eq!(b.render(&pb, &json!({})).unwrap(), "b");
    assert_eq!(a.context().len(), 1);
}

#[test]
fn explicit_global_view_and_configured_render_options() {
    let dir = site();
    let config = WaxConfig::at(dir.path())
        .compile_options(raw())
        .template_options(RenderOptions::default().with_data("env", json!("prod")));
    let mut wax = Wax::tera(config);
    wax.data(Namespace::from([("site".to_string(), json!("S"))])).unwrap();

    let page = wax
        .compile("{{ _data.env | default(value=\"-\") }}:{{ _data.global.g | default(value=\"-\") }}:{{ _data.global._parent.site }}")
        .unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "prod:-:S");

    let explicit = RenderOptions::default().with_data("global", json!({ "g": "G" }));
    assert_eq!(
        wax.render_with(&page, &json!({}), &explicit).unwrap(),
        "-:G:S",
        "call-level data replaces configured data wholesale"
    );
}

// ---------------------------------------------------------------------------
// 2. Registration
// ---------------------------------------------------------------------------

#[test]
fn partials_and_data_from_globs() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.partials(["partials/**/*"])
        .unwrap()
        .data("data/*.{json,yaml}")
        .unwrap();

    assert_eq!(wax.context()["author"], json!("Ann"));
    let page = wax
        .compile("{% include \"header\" %}{% include \"menu\" %}")
        .unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "<h1>S</h1>[home,about]");

    let stray = wax.compile("{% include \"notes\" %}").unwrap();
    assert!(wax.render(&stray, &json!({})).is_err(), "unlisted extensions are not registered");
}

#[test]
fn partial_keygen_override_keeps_directories() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.partials_with(
        ["partials/**/*.tera"],
        &Overrides::new().parse_partial_name(KeyGen::partial()),
    )
    .unwrap()
    .data("data/site.json")
    .unwrap();

    let page = wax.compile("{% include \"nav/menu.main\" %}").unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "[home,about]");
}

#[test]
fn helpers_from_namespace_and_factory() {
    let dir = site();
    let mut wax = wax_at(&dir);

    wax.helpers(Namespace::from([(
        "twice".to_string(),
        Helper::new(|args| {
            let n = args.get("n").and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(n * 2))
        }),
    )]))
    .unwrap()
    .helpers(Source::factory(|engine: &mut TeraEngine, _: &WaxConfig| {
        engine
            .register_helpers(Namespace::from([(
                "answer".to_string(),
                Helper::new(|_| Ok(json!(42))),
            )]))
            .ok()?;
        None
    }))
    .unwrap();

    let page = wax.compile(r#"{{ twice(n=21) }} {{ answer() }}"#).unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "42 42");
}

fn case_loader(path: &Path) -> Result<Module<TeraEngine, Helper>, WaxError> {
    let kind = std::fs::read_to_string(path).map_err(|e| WaxError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let upper = kind.trim() == "upper";
    Ok(Module::Value(Helper::new(move |args| {
        let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(json!(if upper { text.to_uppercase() } else { text.to_lowercase() }))
    })))
}

#[test]
fn nested_helpers_with_default_names_are_callable() {
    let dir = site();
    write(dir.path(), "helpers/text/shout.txt", "upper");
    write(dir.path(), "helpers/text/whisper.txt", "lower");

    let mut wax = wax_at(&dir).with_helper_loader(case_loader);
    wax.helpers("helpers/**/*.txt").unwrap();

    // `text-shout` is exposed to Tera as `text_shout`.
    let page = wax
        .compile(r#"{{ text_shout(text="a") }}{{ text_whisper(text="B") }}"#)
        .unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "Ab");
}

#[test]
fn helper_keygen_override_names_glob_helpers() {
    let dir = site();
    write(dir.path(), "helpers/text/shout.txt", "upper");

    let stem_only = KeyGen::new(|path, _| {
        Ok(path.file_stem().unwrap_or_default().to_string_lossy().into_owned())
    });
    let mut wax = wax_at(&dir).with_helper_loader(case_loader);
    wax.helpers_with(
        "helpers/**/*.txt",
        CallOptions::new().overrides(Overrides::new().parse_helper_name(stem_only)),
    )
    .unwrap();

    let page = wax.compile(r#"{{ shout(text="a") }}"#).unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "A");
}

#[test]
fn helper_names_without_identifier_form_are_rejected() {
    let dir = site();
    write(dir.path(), "helpers/404.txt", "upper");
    let mut wax = wax_at(&dir).with_helper_loader(case_loader);
    let err = wax.helpers("helpers/*.txt").err().expect("error");
    assert!(matches!(err, WaxError::Engine(_)), "got: {err}");
    assert!(err.to_string().contains("404"), "got: {err}");
}

#[test]
fn decorators_wrap_blocks() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.decorators(Module::register(|_: &mut TeraEngine, _: &WaxConfig| {
        Some(Namespace::from([(
            "boxed".to_string(),
            Decorator::new(|value, _| Ok(json!(format!("[{}]", value.as_str().unwrap_or_default())))),
        )]))
    }))
    .unwrap();

    let page = wax.compile("{% filter boxed %}in{% endfilter %}").unwrap();
    assert_eq!(wax.render(&page, &json!({})).unwrap(), "[in]");
}

#[test]
fn helper_globs_without_loader_fail() {
    let dir = site();
    let mut wax = wax_at(&dir);
    let err = wax.helpers("helpers/*.txt").err().expect("error");
    assert!(matches!(err, WaxError::NoLoader { category: "helper" }), "got: {err}");
}

#[test]
fn custom_data_reducer_sees_every_file() {
    let dir = site();
    let mut wax = wax_at(&dir);
    let reducer: wax_core::Reducer<TeraEngine, Value> = Arc::new(
        |mut acc: Namespace<Value>,
         record: FileRecord<TeraEngine, Value>,
         _: &mut TeraEngine,
         _: &ReduceContext<'_>| {
            let stem = record.path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
            acc.insert(stem, json!(true));
            Ok::<_, WaxError>(acc)
        },
    );
    wax.data_with("data/*", CallOptions::new().reducer(reducer)).unwrap();
    assert_eq!(wax.context().get("site"), Some(&json!(true)));
    assert_eq!(wax.context().get("author"), Some(&json!(true)));
}

#[test]
fn empty_data_files_are_not_registered() {
    let dir = site();
    write(dir.path(), "d/blank.txt", "");
    write(dir.path(), "d/motto.txt", "wax on");
    let mut wax = Wax::tera(WaxConfig::at(dir.path()).parse_data_name(KeyGen::helper()));
    wax.data("d/*.txt").unwrap();

    assert_eq!(wax.context().get("blank"), None);
    assert_eq!(wax.context().get("motto"), Some(&json!("wax on")));
}

#[test]
fn facade_reducer_applies_until_a_call_overrides_it() {
    let dir = site();
    let marker = |tag: &'static str| -> wax_core::Reducer<TeraEngine, Value> {
        Arc::new(
            move |mut acc: Namespace<Value>,
                  record: FileRecord<TeraEngine, Value>,
                  _: &mut TeraEngine,
                  _: &ReduceContext<'_>| {
                let stem = record.path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
                acc.insert(stem, json!(tag));
                Ok::<_, WaxError>(acc)
            },
        )
    };
    let mut wax = wax_at(&dir).with_data_reducer(marker("facade"));

    wax.data("data/site.json").unwrap();
    assert_eq!(wax.context().get("site"), Some(&json!("facade")));

    wax.data_with("data/author.yaml", CallOptions::new().reducer(marker("call")))
        .unwrap();
    assert_eq!(wax.context().get("author"), Some(&json!("call")));
}

// ---------------------------------------------------------------------------
// 3. Compile inputs
// ---------------------------------------------------------------------------

#[test]
fn precompiled_templates_are_not_recompiled() {
    let dir = site();
    let mut wax = wax_at(&dir);
    let template = wax
        .engine_mut()
        .compile("pre {{ x }}", &raw())
        .unwrap();
    let page = wax.compile(TemplateInput::Compiled(template.clone())).unwrap();
    assert_eq!(page.template(), &template);
    assert_eq!(wax.render(&page, &json!({ "x": 1 })).unwrap(), "pre 1");
}

#[test]
fn compile_options_escape_by_default() {
    let dir = site();
    let mut wax = Wax::tera(WaxConfig::at(dir.path()));
    let escaped = wax.compile("{{ x }}").unwrap();
    let raw_page = wax.compile_with("{{ x }}", &raw()).unwrap();
    let data = json!({ "x": "<i>" });
    assert_eq!(wax.render(&escaped, &data).unwrap(), "&lt;i&gt;");
    assert_eq!(wax.render(&raw_page, &data).unwrap(), "<i>");
}

// ---------------------------------------------------------------------------
// 4. render_file + cache
// ---------------------------------------------------------------------------

#[test]
fn render_file_uses_partials_and_context() {
    let dir = site();
    let mut wax = wax_at(&dir);
    wax.partials(["partials/*.tera"]).unwrap().data("data/site.json").unwrap();
    let out = wax.render_file("pages/index.tera", &json!({ "title": "Home" })).unwrap();
    assert_eq!(out, "<h1>S</h1>Home");
}

#[test]
fn render_file_missing_template_is_io_error() {
    let dir = site();
    let mut wax = wax_at(&dir);
    let err = wax.render_file("pages/missing.tera", &json!({})).unwrap_err();
    assert!(matches!(err, WaxError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("missing.tera"));
}

#[test]
fn render_file_reuses_cache_when_not_busting() {
    let dir = site();
    write(dir.path(), "pages/v.tera", "v1");
    let mut wax = Wax::tera(WaxConfig::at(dir.path()).bust_cache(false));
    assert_eq!(wax.render_file("pages/v.tera", &json!({})).unwrap(), "v1");

    write(dir.path(), "pages/v.tera", "v2");
    assert_eq!(wax.render_file("pages/v.tera", &json!({})).unwrap(), "v1");
}

#[test]
fn render_file_recompiles_when_busting() {
    let dir = site();
    write(dir.path(), "pages/v.tera", "v1");
    let mut wax = Wax::tera(WaxConfig::at(dir.path()));
    assert!(wax.config().bust_cache);
    assert_eq!(wax.render_file("pages/v.tera", &json!({})).unwrap(), "v1");

    write(dir.path(), "pages/v.tera", "v2");
    assert_eq!(wax.render_file("pages/v.tera", &json!({})).unwrap(), "v2");
}

#[test]
fn busting_releases_replaced_templates() {
    let dir = site();
    let mut wax = Wax::tera(WaxConfig::at(dir.path()));
    for version in ["v1", "v2", "v3", "v2"] {
        write(dir.path(), "pages/v.tera", version);
        assert_eq!(wax.render_file("pages/v.tera", &json!({})).unwrap(), version);
    }
    assert_eq!(wax.engine().template_count(), 1);

    let held = wax.compile("v2").unwrap();
    write(dir.path(), "pages/v.tera", "v4");
    wax.render_file("pages/v.tera", &json!({})).unwrap();
    assert_eq!(wax.render(&held, &json!({})).unwrap(), "v2", "other holders keep the template");
}

#[test]
fn render_file_surfaces_template_errors() {
    let dir = site();
    write(dir.path(), "pages/bad.tera", "{% if %}");
    let mut wax = wax_at(&dir);
    let err = wax.render_file("pages/bad.tera", &json!({})).unwrap_err();
    assert!(matches!(err, WaxError::Engine(_)), "got: {err}");
}
