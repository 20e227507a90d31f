mod helpers;
mod mocks;
mod orders;
mod store_failures;
mod transitions;
