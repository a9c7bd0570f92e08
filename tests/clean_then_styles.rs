use std::error::Error;
use std::fs;
use std::sync::Arc;

use sitebuild::config::{ConfigFile, Mode};
use sitebuild::engine::{run_invocation, Invocation};
use sitebuild::pipeline::{self, BuildContext};

type TestResult = Result<(), Box<dyn Error>>;

fn project(mode: Mode) -> (tempfile::TempDir, Arc<BuildContext>) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Arc::new(BuildContext::new(
        dir.path(),
        Arc::new(ConfigFile::default()),
        mode,
    ));
    (dir, ctx)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn clean_then_styles_leaves_fresh_output_only() -> TestResult {
    let (dir, ctx) = project(Mode::Development);
    let root = dir.path();

    fs::create_dir_all(root.join("app/styles"))?;
    fs::write(root.join("app/styles/main.css"), "body { margin: 0; }\n")?;

    // Stale output from a previous run.
    fs::create_dir_all(root.join(".tmp/css"))?;
    fs::write(root.join(".tmp/css/stale.css"), "/* old */")?;
    fs::create_dir_all(root.join("dist"))?;
    fs::write(root.join("dist/stale.txt"), "old")?;

    let registry = pipeline::default_registry(Arc::clone(&ctx))?;
    run_invocation(
        &registry,
        Invocation::Sequence(vec!["clean".into(), "styles".into()]),
    )
    .await?;

    assert!(root.join(".tmp/css/main.css").is_file(), "fresh stylesheet exists");
    assert!(!root.join(".tmp/css/stale.css").exists(), "stale dev output removed");
    assert!(!root.join("dist/stale.txt").exists(), "stale prod output removed");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_development_build_produces_the_site() -> TestResult {
    let (dir, ctx) = project(Mode::Development);
    let root = dir.path();

    fs::create_dir_all(root.join("app/styles/components"))?;
    fs::write(root.join("app/styles/main.css"), "body { color: #222; }\n")?;
    fs::write(
        root.join("app/styles/components/_button.css"),
        ".button { padding: 1rem; }\n",
    )?;

    fs::create_dir_all(root.join("app/scripts"))?;
    fs::write(root.join("app/scripts/app.js"), "function init() { return 1; }\n")?;
    fs::write(root.join("app/scripts/util.js"), "function add(a, b) { return a + b; }\n")?;

    fs::create_dir_all(root.join("app/fonts"))?;
    fs::write(root.join("app/fonts/body.woff2"), b"\x00fontdata")?;

    fs::create_dir_all(root.join("app/images"))?;
    image::RgbaImage::new(4, 4).save(root.join("app/images/pixel.png"))?;

    fs::create_dir_all(root.join("app/pages"))?;
    fs::create_dir_all(root.join("app/partials"))?;
    fs::write(root.join("app/partials/header.html"), "<header>site</header>")?;
    fs::write(
        root.join("app/pages/about.html"),
        "<body>@@include(\"header.html\")<p>about</p></body>",
    )?;

    fs::write(root.join("app/robots.txt"), "User-agent: *\n")?;
    fs::write(root.join("app/unrelated.html"), "<p>not copied</p>")?;

    let registry = pipeline::default_registry(Arc::clone(&ctx))?;
    run_invocation(&registry, Invocation::Task("build".into())).await?;

    // Staged output.
    assert!(root.join(".tmp/css/main.css").is_file());
    assert!(root.join(".tmp/css/components/_button.css").is_file());
    assert!(root.join(".tmp/js/main.js").is_file());
    let about = fs::read_to_string(root.join(".tmp/about.html"))?;
    assert!(about.contains("<header>site</header>"));
    let toc = fs::read_to_string(root.join(".tmp/index.html"))?;
    assert!(toc.contains("about.html"));

    // Final artifacts.
    assert!(root.join("dist/fonts/body.woff2").is_file());
    assert!(root.join("dist/images/pixel.png").is_file());
    assert!(root.join("dist/robots.txt").is_file());
    assert!(!root.join("dist/unrelated.html").exists(), "page sources are not copied");

    // The script bundle concatenates in sorted order, unminified in dev.
    let bundle = fs::read_to_string(root.join(".tmp/js/main.js"))?;
    let app_pos = bundle.find("function init").unwrap();
    let util_pos = bundle.find("function add").unwrap();
    assert!(app_pos < util_pos);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn production_build_minifies_into_the_final_root() -> TestResult {
    let (dir, ctx) = project(Mode::Production);
    let root = dir.path();

    fs::create_dir_all(root.join("app/styles"))?;
    fs::write(
        root.join("app/styles/main.css"),
        "body {\n  color: #ff0000;\n  margin: 0px;\n}\n",
    )?;
    fs::create_dir_all(root.join("app/scripts"))?;
    fs::write(
        root.join("app/scripts/app.js"),
        "// entry\nfunction init(name) {\n  return 'hello ' + name;\n}\nexport { init };\n",
    )?;

    let registry = pipeline::default_registry(Arc::clone(&ctx))?;
    run_invocation(&registry, Invocation::Task("build".into())).await?;

    let css = fs::read_to_string(root.join("dist/css/main.css"))?;
    assert!(!css.contains('\n'), "production CSS is minified");

    let js = fs::read_to_string(root.join("dist/js/main.js"))?;
    assert!(!js.contains("// entry"), "production JS drops comments");

    assert!(!root.join(".tmp/css/main.css").exists(), "nothing staged in production");

    Ok(())
}

#[test]
fn second_image_run_skips_unchanged_inputs() -> TestResult {
    let (dir, ctx) = project(Mode::Development);
    let root = dir.path();

    fs::create_dir_all(root.join("app/images"))?;
    image::RgbaImage::new(4, 4).save(root.join("app/images/pixel.png"))?;

    pipeline::images::run(&ctx)?;

    let dest = root.join("dist/images/pixel.png");
    assert!(dest.is_file());
    let first_mtime = fs::metadata(&dest)?.modified()?;

    // Unchanged input: the cached hash short-circuits the re-encode.
    pipeline::images::run(&ctx)?;
    let second_mtime = fs::metadata(&dest)?.modified()?;
    assert_eq!(first_mtime, second_mtime);

    Ok(())
}
