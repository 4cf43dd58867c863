mod http;
mod properties;
