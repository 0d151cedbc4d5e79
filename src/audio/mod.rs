pub(crate) mod mixer;
