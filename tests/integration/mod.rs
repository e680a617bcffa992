// Integration tests harness
mod specialization {
    include!("specialization.rs");
}
mod linking {
    include!("linking.rs");
}
mod metamethods {
    include!("metamethods.rs");
}
mod ffi {
    include!("ffi.rs");
}
mod errors {
    include!("errors.rs");
}
mod shapes {
    include!("shapes.rs");
}
