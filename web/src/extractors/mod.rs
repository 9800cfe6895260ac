pub(crate) mod button_secret;
