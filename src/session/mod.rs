pub mod typestream;
