//! End-to-end tests spanning parsing, rendering, expansion, and the store.
