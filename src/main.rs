use log::error;

fn main() {
    env_logger::init();

    if let Err(e) = seawatch::get_arg().and_then(seawatch::run) {
        error!("{e:#}");
        std::process::exit(-1);
    }
}
