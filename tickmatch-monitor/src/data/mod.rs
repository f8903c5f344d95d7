pub mod demo_stream;
