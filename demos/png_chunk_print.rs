use std::{fs::File, io::BufReader};

use vszimg::png::{text::chunk_script, PngChunkReader};

fn main() {
  let args: Vec<String> = std::env::args().collect();
  println!("ARGS: {args:?}");
  for file_arg in args[1..].iter() {
    let path = std::path::Path::new(file_arg);
    print!("Reading `{}`... ", path.display());
    let file = match File::open(path) {
      Ok(file) => {
        println!("opened.");
        file
      }
      Err(e) => {
        println!("{e:?}");
        continue;
      }
    };
    for (n, chunk_res) in PngChunkReader::new(BufReader::new(file)).lenient(true).enumerate() {
      match chunk_res {
        Ok(chunk) => match chunk_script(&chunk) {
          Some(script) => println!("{n}: {chunk:?} holds a {} byte script", script.len()),
          None => println!("{n}: {chunk:?}"),
        },
        Err(e) => println!("{n}: {e}"),
      }
    }
  }
}
