// Create the Error, ErrorKind, ResultExt, and Result types.
// Result is a typedef of std `Result` with the error type our own `Error`.
// Defines the From conversions that let try! and ? work for our `Error`.
// ResultExt adds the `chain_err` trait method.
use error_chain::*;

error_chain! {

    foreign_links {
        Io(::std::io::Error);
        Serialisation(::serde_json::Error);
    }

    errors {
        InvalidGridDimensions(width: usize, height: usize) {
            description("invalid grid dimensions")
            display("invalid grid dimensions {}x{}, both must be non zero", width, height)
        }
        MismatchedGridRecord {
            description("maze record does not match the grid it is restored into")
            display("maze record does not match the grid it is restored into")
        }
    }
}
