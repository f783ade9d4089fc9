use lazy_static::lazy_static;

pub mod sql;
pub mod store;

lazy_static! {
    /// Shared RON options for marshalling declarations.
    pub static ref RON: ron::Options =
        ron::Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME);
}
