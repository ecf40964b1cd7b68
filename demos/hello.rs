use reli::{ArgSpec, CommandDescriptor};

fn greet() -> CommandDescriptor {
    CommandDescriptor::new("greet")
        .description("Say hello")
        .arg(ArgSpec::positional("name").required())
        .arg(ArgSpec::boolean("emoji").alias("e"))
        .arg(ArgSpec::number("times").default(1))
        .on_init(|ctx| async move {
            tracing::info!("starting {}", ctx.path.join(" "));
            Ok(())
        })
        .handler(|ctx| async move {
            let name = ctx.args.str("name").unwrap_or_default();
            let bang = if ctx.args.flag("emoji") { "❣️" } else { "!" };
            for _ in 0..ctx.args.num("times").unwrap_or(1.0) as u32 {
                println!("Hello {name}{bang}");
            }
            Ok(())
        })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cmd = CommandDescriptor::new("hello")
        .version("0.1.0")
        .description("Greets people")
        .subcommand("greet", || async { greet() })
        .default_subcommand("greet");
    reli::run_main(cmd).await
}
