mod args;
mod error;
mod exportar;
mod mapeamento;
mod metadata;
mod regex;
mod similaridade;
mod tabela;
mod texto;

pub use self::{
    args::*, error::*, exportar::*, mapeamento::*, metadata::*, regex::*, similaridade::*,
    tabela::*, texto::*,
};
