use proc_macro::TokenStream;
use quote::ToTokens;
use syn::parse_quote;

/// This macro is added before a method of the `Simulator` struct in the impl
/// block. Use it to first check that the hand state machine is in exactly the
/// phase named in the attribute.
///
/// For example, `#[require_phase(PlayerActing)]` makes the method return an
/// error message unless `self.phase` is `HandPhase::PlayerActing`.
#[proc_macro_attribute]
pub fn require_phase(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut method: syn::ImplItemFn =
        syn::parse(item).expect("require_phase must annotate an impl method");
    let phase: syn::Ident =
        syn::parse(attr).expect("require_phase expects a HandPhase variant name");
    let message = format!(
        "{} is only allowed in the {} phase",
        method.sig.ident, phase
    );
    let guard: syn::Stmt = parse_quote! {
        if self.phase != HandPhase::#phase {
            return Err(String::from(#message));
        }
    };
    method.block.stmts.insert(0, guard);
    method.into_token_stream().into()
}
