use std::sync::{Arc, Mutex};

use futures::future::{self, Ready};
use reli::{run_command, ArgSpec, CommandContext, CommandDescriptor, Error, RunOptions};

type Log = Arc<Mutex<Vec<String>>>;

fn record(
    log: &Log,
    event: &'static str,
    fail: bool,
) -> impl Fn(CommandContext) -> Ready<anyhow::Result<()>> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |ctx| {
        log.lock().unwrap().push(format!("{event} {}", ctx.path.join("/")));
        future::ready(if fail { Err(anyhow::anyhow!("{event} failed")) } else { Ok(()) })
    }
}

fn cmd(log: &Log, init_fails: bool, handler_fails: bool, exit_fails: bool) -> CommandDescriptor {
    CommandDescriptor::new("app").subcommand("deploy", {
        let log = Arc::clone(log);
        move || {
            let log = Arc::clone(&log);
            async move {
                CommandDescriptor::new("deploy")
                    .arg(ArgSpec::positional("target").required())
                    .on_init(record(&log, "init", init_fails))
                    .handler(record(&log, "run", handler_fails))
                    .on_exit(record(&log, "exit", exit_fails))
            }
        }
    })
}

fn hooks() -> RunOptions {
    RunOptions::default().lifecycle_hooks(true)
}

#[tokio::test]
async fn hooks_are_opt_in() {
    let log = Log::default();
    run_command(&cmd(&log, false, false, false), ["deploy prod"], &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(*log.lock().unwrap(), ["run app/deploy"]);

    let log = Log::default();
    run_command(&cmd(&log, false, false, false), ["deploy prod"], &hooks()).await.unwrap();
    assert_eq!(*log.lock().unwrap(), ["init app/deploy", "run app/deploy", "exit app/deploy"]);
}

#[tokio::test]
async fn handler_sees_typed_args() {
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    let root = CommandDescriptor::new("app")
        .arg(ArgSpec::positional("target").required())
        .arg(ArgSpec::boolean("force").alias("f"))
        .handler(move |ctx| {
            *slot.lock().unwrap() = Some(ctx);
            future::ready(Ok(()))
        });
    run_command(&root, ["prod -f extra"], &RunOptions::default()).await.unwrap();

    let ctx = seen.lock().unwrap().take().unwrap();
    assert_eq!(ctx.args.str("target"), Some("prod"));
    assert!(ctx.args.flag("force"));
    assert_eq!(ctx.args.rest(), ["extra"]);
    assert_eq!(ctx.raw_args, ["prod", "-f", "extra"]);
}

#[tokio::test]
async fn exit_hook_runs_after_failure() {
    let log = Log::default();
    let err = run_command(&cmd(&log, false, true, false), ["deploy", "prod"], &hooks())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "run failed");
    assert!(matches!(err, Error::Handler { exit_hook: None, .. }));
    assert_eq!(*log.lock().unwrap(), ["init app/deploy", "run app/deploy", "exit app/deploy"]);
}

#[tokio::test]
async fn handler_error_wins_over_hook_error() {
    let log = Log::default();
    let err = run_command(&cmd(&log, false, true, true), ["deploy", "prod"], &hooks())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "run failed");
    match err {
        Error::Handler { exit_hook: Some(hook), .. } => assert_eq!(hook.to_string(), "exit failed"),
        other => panic!("unexpected error: {other:?}"),
    }

    let log = Log::default();
    let err = run_command(&cmd(&log, false, false, true), ["deploy", "prod"], &hooks())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Lifecycle hook failed: exit failed");
}

#[tokio::test]
async fn failing_init_skips_handler() {
    let log = Log::default();
    let err = run_command(&cmd(&log, true, false, false), ["deploy", "prod"], &hooks())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Lifecycle hook failed: init failed");
    assert_eq!(*log.lock().unwrap(), ["init app/deploy"]);
}

#[tokio::test]
async fn parse_errors_propagate() {
    let log = Log::default();
    let err = run_command(&cmd(&log, false, false, false), ["deploy"], &hooks()).await.unwrap_err();
    assert_eq!(err.to_string(), "Missing required argument: target");
    assert!(log.lock().unwrap().is_empty());

    let err = run_command(&cmd(&log, false, false, false), ["nope"], &hooks()).await.unwrap_err();
    assert_eq!(err.to_string(), "A subcommand is required. Available: deploy");
}
