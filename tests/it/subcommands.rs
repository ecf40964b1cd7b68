use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use expect_test::expect;
use reli::{normalize, parse_command, resolve_subcommand, ArgSpec, CommandDescriptor, RunOptions};

fn some_sub_cmd() -> CommandDescriptor {
    CommandDescriptor::new("someSubCmd")
        .arg(ArgSpec::positional("input").required())
        .arg(ArgSpec::boolean("cjs").default(true))
}

fn build() -> CommandDescriptor {
    CommandDescriptor::new("build").subcommand("someSubCmd", || async { some_sub_cmd() })
}

fn root() -> CommandDescriptor {
    CommandDescriptor::new("reli")
        .arg(ArgSpec::boolean("verbose"))
        .subcommand("build", || async { build() })
        .subcommand("serve", || async {
            CommandDescriptor::new("serve").arg(ArgSpec::number("port").default(8080))
        })
}

fn tokens(args: &str) -> Vec<String> {
    normalize([args])
}

#[tokio::test]
async fn nested_subcommand() {
    let (cmd, ctx) = parse_command(
        &root(),
        ["build", "someSubCmd", "src/mod.ts", "--no-cjs"],
        &RunOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(cmd.name(), "someSubCmd");
    assert_eq!(ctx.path, ["reli", "build", "someSubCmd"]);
    assert_eq!(ctx.raw_args, ["src/mod.ts", "--no-cjs"]);
    assert_eq!(ctx.args.str("input"), Some("src/mod.ts"));
    assert!(!ctx.args.flag("cjs"));
}

#[tokio::test]
async fn root_without_subcommands() {
    let root = CommandDescriptor::new("dev")
        .arg(ArgSpec::boolean("dev"))
        .arg(ArgSpec::string("build"));
    let (cmd, ctx) =
        parse_command(&root, ["--dev true --build mod.ts"], &RunOptions::default()).await.unwrap();
    assert_eq!(cmd.name(), "dev");
    assert_eq!(ctx.path, ["dev"]);
    assert!(ctx.args.flag("dev"));
    assert_eq!(ctx.args.str("build"), Some("mod.ts"));

    // A token equal to a would-be command name is just a positional.
    let root = CommandDescriptor::new("plain").arg(ArgSpec::positional("what"));
    let resolved = resolve_subcommand(&root, tokens("build --x"), true).await.unwrap();
    assert_eq!(resolved.path, ["plain"]);
    assert_eq!(resolved.tokens, ["build", "--x"]);
}

#[tokio::test]
async fn flags_before_command_names() {
    let resolved = resolve_subcommand(&root(), tokens("--verbose build -q someSubCmd in"), false)
        .await
        .unwrap();
    assert_eq!(resolved.command.name(), "someSubCmd");
    assert_eq!(resolved.tokens, ["--verbose", "-q", "in"]);
}

#[tokio::test]
async fn stops_at_first_unmatched_token() {
    let resolved =
        resolve_subcommand(&root(), tokens("build other someSubCmd"), false).await.unwrap();
    assert_eq!(resolved.path, ["reli", "build"]);
    assert_eq!(resolved.tokens, ["other", "someSubCmd"]);

    let resolved = resolve_subcommand(&root(), tokens("-- build"), false).await.unwrap();
    assert_eq!(resolved.path, ["reli"]);
    assert_eq!(resolved.tokens, ["--", "build"]);

    let (cmd, ctx) =
        parse_command(&root(), ["serve", "--port", "3000"], &RunOptions::default()).await.unwrap();
    assert_eq!(cmd.name(), "serve");
    assert_eq!(ctx.args.num("port"), Some(3000.0));
}

#[tokio::test]
async fn required_subcommand() {
    let err = resolve_subcommand(&root(), tokens("nope"), true).await.unwrap_err();
    expect!["Unknown command: nope. Available: build, serve"].assert_eq(&err.to_string());

    let err = resolve_subcommand(&root(), tokens("--verbose"), true).await.unwrap_err();
    expect!["A subcommand is required. Available: build, serve"].assert_eq(&err.to_string());

    let err = resolve_subcommand(&root(), tokens("build"), true).await.unwrap_err();
    expect!["A subcommand is required. Available: someSubCmd"].assert_eq(&err.to_string());

    let resolved = resolve_subcommand(&root(), tokens("nope"), false).await.unwrap();
    assert_eq!(resolved.path, ["reli"]);
    assert_eq!(resolved.tokens, ["nope"]);
}

#[tokio::test]
async fn default_subcommand() {
    let root = root().default_subcommand("serve");
    let resolved = resolve_subcommand(&root, tokens("--port 1"), true).await.unwrap();
    assert_eq!(resolved.path, ["reli", "serve"]);
    assert_eq!(resolved.tokens, ["--port", "1"]);

    let resolved = resolve_subcommand(&root, tokens("build someSubCmd x"), true).await.unwrap();
    assert_eq!(resolved.path, ["reli", "build", "someSubCmd"]);
}

#[tokio::test]
async fn factories_are_lazy() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = |name: &'static str| {
        let built = Arc::clone(&built);
        move || {
            built.fetch_add(1, Ordering::SeqCst);
            async move { CommandDescriptor::new(name) }
        }
    };
    let root = CommandDescriptor::new("root")
        .subcommand("a", counter("a"))
        .subcommand("b", counter("b"))
        .subcommand("c", counter("c"));

    assert_eq!(built.load(Ordering::SeqCst), 0);
    let resolved = resolve_subcommand(&root, tokens("b a"), false).await.unwrap();
    assert_eq!(resolved.command.name(), "b");
    assert_eq!(resolved.tokens, ["a"]);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}
