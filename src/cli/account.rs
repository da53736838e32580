use crate::client::rpc_client::RpcClient;

pub async fn handle_signup_command(client: &RpcClient, password: String) {
    match client.signup(&password).await {
        Ok(created) => {
            println!("Account created.");
            println!("Address:    {}", created.address);
            println!("Public Key: {}", created.pubkey);
            println!("Mnemonic:   {}", created.mnemonic);
            println!("KEEP THIS SAFE!");
        }
        Err(e) => println!("Signup failed: {}", e),
    }
}

pub async fn handle_login_command(client: &RpcClient, address: String, password: String) {
    match client.login(&address, &password).await {
        Ok(res) => println!("Logged in as {} (key {})", address, res.address_key_id),
        Err(e) => println!("Login failed: {}", e),
    }
}

pub async fn handle_logout_command(client: &RpcClient) {
    match client.logout().await {
        Ok(res) => match res.address {
            Some(address) => println!("Logged out {}", address),
            None => println!("No account was selected"),
        },
        Err(e) => println!("Logout failed: {}", e),
    }
}
