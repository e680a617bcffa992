mod arithmetic {
    include!("arithmetic.rs");
}
mod selection {
    include!("selection.rs");
}
