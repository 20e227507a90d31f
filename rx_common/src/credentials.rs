use crate::Secret;

/// Login and secret a corporation uses to authenticate against the external booking system on behalf of its shops.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub secret: Secret<String>,
}

impl Credentials {
    pub fn new<S: Into<String>>(login: S, secret: S) -> Self {
        Self { login: login.into(), secret: Secret::new(secret.into()) }
    }
}
