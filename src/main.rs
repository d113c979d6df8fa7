fn main() {
    newrelic_lambda::app::cli::run();
}
