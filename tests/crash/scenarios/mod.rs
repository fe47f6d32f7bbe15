mod lock;
mod rewrite;
