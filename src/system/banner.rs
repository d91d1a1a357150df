use std::net::SocketAddr;

pub(crate) fn print_cli_banner(dashboard: &SocketAddr) {
    println!(
        "surge v{} | {} | remote-controlled load generator",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE")
    );
    println!("Dashboard: http://{}", dashboard);
    println!();
}
