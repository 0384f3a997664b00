mod common;
mod navigation;
mod pages;
